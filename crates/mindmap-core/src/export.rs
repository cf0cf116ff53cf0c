//! Plain-text export.
//!
//! Flattens a subtree to the tab-indented outline format used by the
//! "copy as text" surface: one line per node, one leading tab per level of
//! depth below the exported root, children in display order. Collapsed
//! nodes are exported like any other; expansion is view state.

use crate::forest::Forest;
use crate::node::NodeId;
use std::fmt::Write;

/// Flatten the subtree rooted at `id`, or `None` if the id does not
/// resolve.
pub fn plain_text(forest: &Forest, id: &NodeId) -> Option<String> {
    let root = forest.get(id)?;
    let mut out = String::new();
    let mut stack: Vec<(&NodeId, usize)> = vec![(&root.id, 0)];
    while let Some((current, depth)) = stack.pop() {
        let node = forest.get(current)?;
        if !out.is_empty() {
            out.push('\n');
        }
        for _ in 0..depth {
            out.push('\t');
        }
        let _ = write!(out, "{}", node.name);
        for child in node.children.iter().rev() {
            stack.push((child, depth + 1));
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MapEditor;

    #[test]
    fn test_plain_text_indents_by_depth() {
        let mut editor = MapEditor::new();
        let root = editor.forest().roots()[0].clone();
        let a = editor.add_child_named(&root, "A").unwrap();
        let _a1 = editor.add_child_named(&a, "A1").unwrap();
        let _b = editor.add_child_named(&root, "B").unwrap();

        let text = plain_text(editor.forest(), &root).unwrap();
        assert_eq!(text, "Root\n\tA\n\t\tA1\n\tB");
    }

    #[test]
    fn test_plain_text_of_leaf_is_bare_name() {
        let mut editor = MapEditor::new();
        let root = editor.forest().roots()[0].clone();
        let a = editor.add_child_named(&root, "Leaf").unwrap();
        assert_eq!(plain_text(editor.forest(), &a).unwrap(), "Leaf");
    }

    #[test]
    fn test_plain_text_includes_collapsed_children() {
        let mut editor = MapEditor::new();
        let root = editor.forest().roots()[0].clone();
        let a = editor.add_child_named(&root, "A").unwrap();
        let _a1 = editor.add_child_named(&a, "A1").unwrap();
        editor.toggle_expanded(&a).unwrap();

        let text = plain_text(editor.forest(), &root).unwrap();
        assert_eq!(text, "Root\n\tA\n\t\tA1");
    }

    #[test]
    fn test_plain_text_unknown_id() {
        let editor = MapEditor::new();
        assert!(plain_text(editor.forest(), &crate::NodeId::fresh()).is_none());
    }
}
