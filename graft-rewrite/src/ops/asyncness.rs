//! `strip-async`: turn asynchronous code into its synchronous twin.
//!
//! One pass removes `async` modifiers and `await` keywords, drops
//! `.ConfigureAwait(..)`, unwraps `Task<T>`/`ValueTask<T>` to `T`, turns
//! non-generic task return types into `void` and `Func<.., Task>` into
//! `Action<..>`, and replaces `Task.FromResult(x)` with `x` and
//! `return Task.CompletedTask;` with `return;`. Passes repeat until one makes
//! no edits, so nested constructs (`Task<Task<T>>`, awaited awaits) unwind.

use tree_sitter::Node;

use crate::error::RewriteError;
use crate::syntax::{declared_type, is_field, named_children, removal_span, Edit, SyntaxDoc};

const MAX_PASSES: usize = 16;
const TASK_TYPES: &[&str] = &["Task", "ValueTask"];

pub(crate) fn strip_async(mut doc: SyntaxDoc) -> Result<SyntaxDoc, RewriteError> {
    for pass in 0..MAX_PASSES {
        let edits = collect(&doc);
        if edits.is_empty() {
            return Ok(doc);
        }
        tracing::trace!(pass, edits = edits.len(), file = doc.file_name(), "strip-async pass");
        doc = doc.apply(edits)?;
    }
    tracing::warn!(file = doc.file_name(), "strip-async did not settle after {MAX_PASSES} passes");
    Ok(doc)
}

fn collect(doc: &SyntaxDoc) -> Vec<Edit> {
    let mut edits = Vec::new();
    for node in doc.all_nodes() {
        match node.kind() {
            "modifier" if doc.text(node) == "async" => edits.push(delete_token(doc, node)),
            "async" if !node.is_named() => edits.push(delete_token(doc, node)),
            "await" if !node.is_named() && node.parent().is_some_and(|p| p.kind() != "await_expression") => {
                edits.push(delete_token(doc, node));
            }
            "await_expression" => {
                if let Some(operand) = named_children(node).into_iter().last() {
                    edits.push(Edit::replace(node, doc.text(operand)));
                }
            }
            "invocation_expression" => edits.extend(invocation_edit(doc, node)),
            "return_statement" => {
                let completed = named_children(node).into_iter().next().is_some_and(|value| {
                    let text: String = doc.text(value).split_whitespace().collect();
                    TASK_TYPES.iter().any(|t| text == format!("{t}.CompletedTask"))
                });
                if completed {
                    edits.push(Edit::replace(node, "return;"));
                }
            }
            "generic_name" => edits.extend(generic_edit(doc, node)),
            "identifier" | "qualified_name" => {
                if is_return_type(node) && is_task(doc, node) {
                    edits.push(Edit::replace(node, "void"));
                }
            }
            _ => {}
        }
    }
    edits
}

/// Delete a keyword token and the spaces after it.
fn delete_token(doc: &SyntaxDoc, node: Node<'_>) -> Edit {
    let (start, end) = removal_span(doc.source(), node.start_byte(), node.end_byte());
    Edit::delete(start, end)
}

/// `x.ConfigureAwait(false)` and `Task.FromResult(x)`.
fn invocation_edit(doc: &SyntaxDoc, node: Node<'_>) -> Option<Edit> {
    let function = node.child_by_field_name("function")?;
    if function.kind() != "member_access_expression" {
        return None;
    }
    let receiver = function.child_by_field_name("expression")?;
    let member = function.child_by_field_name("name")?;
    let member_name = simple_name(doc, member);
    if member_name == "ConfigureAwait" {
        return Some(Edit::replace(node, doc.text(receiver)));
    }
    if member_name == "FromResult" && TASK_TYPES.contains(&doc.text(receiver)) {
        let args = node.child_by_field_name("arguments")?;
        let only = match named_children(args).as_slice() {
            [arg] => *arg,
            _ => return None,
        };
        let value = named_children(only).into_iter().last()?;
        return Some(Edit::replace(node, doc.text(value)));
    }
    None
}

/// `Task<T>` becomes `T`; `Func<A, Task>` becomes `Action<A>`.
fn generic_edit(doc: &SyntaxDoc, node: Node<'_>) -> Option<Edit> {
    let name = simple_name(doc, node);
    let args = named_children(node)
        .into_iter()
        .find(|c| c.kind() == "type_argument_list")
        .map(named_children)
        .unwrap_or_default();

    if TASK_TYPES.contains(&name) {
        if args.len() != 1 || !is_type_context(node) {
            return None;
        }
        return Some(Edit::replace(outermost_qualified(node), doc.text(args[0])));
    }

    if name == "Func" {
        let (last, inputs) = args.split_last()?;
        if !is_task(doc, *last) {
            return None;
        }
        let replacement = if inputs.is_empty() {
            "Action".to_string()
        } else {
            let inputs: Vec<&str> = inputs.iter().map(|a| doc.text(*a)).collect();
            format!("Action<{}>", inputs.join(", "))
        };
        return Some(Edit::replace(outermost_qualified(node), replacement));
    }
    None
}

/// `Task`, `ValueTask`, or a qualified name ending in either.
fn is_task(doc: &SyntaxDoc, node: Node<'_>) -> bool {
    match node.kind() {
        "identifier" => TASK_TYPES.contains(&doc.text(node)),
        "qualified_name" => node
            .child_by_field_name("name")
            .is_some_and(|n| n.kind() == "identifier" && TASK_TYPES.contains(&doc.text(n))),
        _ => false,
    }
}

/// `true` for the declared return type of a method, local function or delegate.
fn is_return_type(node: Node<'_>) -> bool {
    node.parent().is_some_and(|p| {
        matches!(
            p.kind(),
            "method_declaration" | "local_function_statement" | "delegate_declaration"
        ) && declared_type(p).is_some_and(|t| t.id() == node.id())
    })
}

/// Generic names in expression position (`Task<int>.Run`, calls) are left alone.
fn is_type_context(node: Node<'_>) -> bool {
    match node.parent() {
        Some(p) if p.kind() == "member_access_expression" => false,
        Some(p) if p.kind() == "invocation_expression" => false,
        Some(p) if p.kind() == "qualified_name" => is_field(p, "name", node),
        _ => true,
    }
}

fn outermost_qualified(node: Node<'_>) -> Node<'_> {
    let mut current = node;
    while let Some(parent) = current.parent() {
        if parent.kind() == "qualified_name" && is_field(parent, "name", current) {
            current = parent;
        } else {
            break;
        }
    }
    current
}

/// Identifier text of a simple or generic name.
fn simple_name<'d>(doc: &'d SyntaxDoc, node: Node<'_>) -> &'d str {
    let id = if node.kind() == "generic_name" {
        named_children(node).into_iter().find(|c| c.kind() == "identifier")
    } else {
        Some(node)
    };
    id.map_or("", |id| doc.text(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(src: &str) -> String {
        let doc = SyntaxDoc::parse("W.cs", src).unwrap();
        strip_async(doc).unwrap().into_source()
    }

    #[test]
    fn async_method_becomes_synchronous() {
        let out = strip(
            "class W\n{\n    public async Task<int> LoadAsync()\n    {\n        var x = await ReadAsync().ConfigureAwait(false);\n        return x;\n    }\n}\n",
        );
        assert!(out.contains("public int LoadAsync()"), "got:\n{out}");
        assert!(out.contains("var x = ReadAsync();"), "got:\n{out}");
        assert!(!out.contains("async "));
    }

    #[test]
    fn non_generic_task_returns_void() {
        let out = strip("class W { public Task Run() { return Task.CompletedTask; } }");
        assert!(out.contains("public void Run() { return; }"), "got:\n{out}");
    }

    #[test]
    fn from_result_and_qualified_tasks_unwrap() {
        let out = strip(
            "class W { System.Threading.Tasks.Task<string> Name() => Task.FromResult(\"w\"); }",
        );
        assert!(out.contains("string Name() => \"w\";"), "got:\n{out}");
    }

    #[test]
    fn func_returning_task_becomes_action() {
        let out = strip("class W { void M(Func<int, Task> a, Func<Task> b, Func<Task<int>> c) { } }");
        assert!(out.contains("Action<int> a"), "got:\n{out}");
        assert!(out.contains("Action b"), "got:\n{out}");
        assert!(out.contains("Func<int> c"), "got:\n{out}");
    }

    #[test]
    fn nested_tasks_unwind_over_passes() {
        let out = strip("class W { Task<Task<int>> M() => null; }");
        assert!(out.contains("int M()"), "got:\n{out}");
    }

    #[test]
    fn async_lambdas_unwrap() {
        let out = strip("class W { void M() { Func<Task> f = async () => await Go(); } }");
        assert!(out.contains("Action f = () => Go();"), "got:\n{out}");
    }
}
