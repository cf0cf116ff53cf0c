use mindmap_core::{MapEditor, NodeId, RedoOutcome, SiblingOrder, UndoOutcome};

fn root_of(editor: &MapEditor) -> NodeId {
    editor.forest().roots()[0].clone()
}

#[test]
fn test_undo_redo_rename_round_trip() {
    let mut editor = MapEditor::new();
    let root = root_of(&editor);

    editor.rename_node(&root, "Project").unwrap();
    assert_eq!(editor.forest().get(&root).unwrap().name, "Project");
    assert!(editor.can_undo());
    assert!(!editor.can_redo());

    assert_eq!(editor.undo(), UndoOutcome::Applied);
    assert_eq!(editor.forest().get(&root).unwrap().name, "Root");
    assert!(!editor.can_undo());
    assert!(editor.can_redo());

    assert_eq!(editor.redo(), RedoOutcome::Applied);
    assert_eq!(editor.forest().get(&root).unwrap().name, "Project");
    assert!(editor.can_undo());
    assert!(!editor.can_redo());
}

#[test]
fn test_undo_redo_color_and_bold() {
    let mut editor = MapEditor::new();
    let root = root_of(&editor);

    editor.set_color(&root, "#ff0000").unwrap();
    editor.toggle_bold(&root).unwrap();
    assert!(editor.forest().get(&root).unwrap().bold);

    editor.undo();
    assert!(!editor.forest().get(&root).unwrap().bold);
    editor.undo();
    assert_eq!(editor.forest().get(&root).unwrap().color, "black");

    editor.redo();
    assert_eq!(editor.forest().get(&root).unwrap().color, "#ff0000");
    editor.redo();
    assert!(editor.forest().get(&root).unwrap().bold);
}

#[test]
fn test_undo_delete_restores_subtree_exactly() {
    let mut editor = MapEditor::new();
    let root = root_of(&editor);
    let a = editor.add_child_named(&root, "A").unwrap();
    let b = editor.add_child_named(&root, "B").unwrap();
    let c = editor.add_child_named(&root, "C").unwrap();
    let b1 = editor.add_child_named(&b, "B1").unwrap();
    let b2 = editor.add_child_named(&b, "B2").unwrap();
    editor.set_color(&b1, "blue").unwrap();
    editor.toggle_bold(&b2).unwrap();
    editor.toggle_expanded(&b).unwrap();

    let before = editor.forest().clone();
    editor.delete_subtree(&b).unwrap();
    assert!(!editor.forest().contains(&b));
    assert!(!editor.forest().contains(&b1));
    assert_eq!(editor.forest().children(&root).unwrap(), &[a.clone(), c.clone()]);

    // Restoration is deep-equal: same ids, attributes, child order, and
    // the same sibling index between A and C.
    editor.undo();
    assert_eq!(editor.forest(), &before);
    assert_eq!(
        editor.forest().children(&root).unwrap(),
        &[a, b.clone(), c]
    );
    assert_eq!(editor.forest().get(&b1).unwrap().color, "blue");
    assert!(editor.forest().get(&b2).unwrap().bold);
    assert!(!editor.forest().get(&b).unwrap().expanded);

    // Redo of a delete removes the subtree again.
    assert_eq!(editor.redo(), RedoOutcome::Applied);
    assert!(!editor.forest().contains(&b));
    editor.forest().check_invariants().unwrap();
}

#[test]
fn test_undo_delete_of_root_restores_root_index() {
    let mut editor = MapEditor::new();
    let first = root_of(&editor);
    let second = editor.add_sibling_named(&first, "Second").unwrap();
    let third = editor.add_sibling_named(&second, "Third").unwrap();

    editor.delete_subtree(&second).unwrap();
    assert_eq!(editor.forest().roots(), &[first.clone(), third.clone()]);

    editor.undo();
    assert_eq!(editor.forest().roots(), &[first, second, third]);
}

#[test]
fn test_undo_move_restores_previous_index() {
    let mut editor = MapEditor::new();
    let root = root_of(&editor);
    let a = editor.add_child_named(&root, "A").unwrap();
    let b = editor.add_child_named(&root, "B").unwrap();
    let c = editor.add_child_named(&root, "C").unwrap();

    editor.move_as_child(&b, Some(&a)).unwrap();
    assert_eq!(editor.forest().children(&a).unwrap(), &[b.clone()]);

    editor.undo();
    // B returns between A and C, not at the end.
    assert_eq!(
        editor.forest().children(&root).unwrap(),
        &[a.clone(), b.clone(), c.clone()]
    );

    assert_eq!(editor.redo(), RedoOutcome::Applied);
    assert_eq!(editor.forest().children(&a).unwrap(), &[b.clone()]);
    assert_eq!(editor.forest().children(&root).unwrap(), &[a, c]);
    editor.forest().check_invariants().unwrap();
}

#[test]
fn test_redo_of_add_is_unsupported() {
    let mut editor = MapEditor::new();
    let root = root_of(&editor);
    let a = editor.add_child(&root).unwrap();

    editor.undo();
    assert!(!editor.forest().contains(&a));
    assert!(editor.can_redo());

    assert_eq!(editor.redo(), RedoOutcome::Unsupported);
    assert!(!editor.forest().contains(&a));
    assert!(!editor.can_redo());
    // The record returned to the undo stack; undoing it again is harmless.
    assert!(editor.can_undo());
    assert_eq!(editor.undo(), UndoOutcome::Applied);
    assert_eq!(editor.forest().len(), 1);
    editor.forest().check_invariants().unwrap();
}

#[test]
fn test_redo_of_paste_is_unsupported() {
    let mut editor = MapEditor::new();
    let root = root_of(&editor);
    let a = editor.add_child_named(&root, "A").unwrap();
    editor.copy(&a).unwrap();
    let pasted = editor.paste(Some(&root)).unwrap();

    editor.undo();
    assert!(!editor.forest().contains(&pasted));

    assert_eq!(editor.redo(), RedoOutcome::Unsupported);
    assert!(!editor.forest().contains(&pasted));
}

#[test]
fn test_new_action_clears_redo() {
    let mut editor = MapEditor::new();
    let root = root_of(&editor);

    editor.rename_node(&root, "One").unwrap();
    editor.undo();
    assert!(editor.can_redo());

    editor.rename_node(&root, "Two").unwrap();
    assert!(!editor.can_redo());
    assert_eq!(editor.redo(), RedoOutcome::Empty);
}

#[test]
fn test_reorder_is_not_undoable_and_keeps_redo() {
    let mut editor = MapEditor::new();
    let root = root_of(&editor);
    let a = editor.add_child_named(&root, "A").unwrap();
    let b = editor.add_child_named(&root, "B").unwrap();

    editor.rename_node(&a, "A renamed").unwrap();
    editor.undo();
    assert!(editor.can_redo());

    // Reordering pushes no record and does not clear the redo stack.
    let depth = editor.undo_depth();
    editor.reorder_sibling(&b, SiblingOrder::Up).unwrap();
    assert_eq!(editor.undo_depth(), depth);
    assert!(editor.can_redo());
    assert_eq!(editor.forest().children(&root).unwrap(), &[b.clone(), a.clone()]);

    // Undo skips straight past the reorder to the add below it.
    editor.undo();
    assert!(!editor.forest().contains(&b));
    assert_eq!(editor.forest().children(&root).unwrap(), &[a]);
}

#[test]
fn test_empty_stacks_report_empty() {
    let mut editor = MapEditor::new();
    assert_eq!(editor.undo(), UndoOutcome::Empty);
    assert_eq!(editor.redo(), RedoOutcome::Empty);
    assert!(!editor.is_modified());
}

#[test]
fn test_add_add_move_unwinds_in_three_undos() {
    let mut editor = MapEditor::new();
    let root = root_of(&editor);
    let initial = editor.forest().clone();

    let a = editor.add_child(&root).unwrap();
    let b = editor.add_child(&a).unwrap();
    editor.move_as_child(&b, Some(&root)).unwrap();
    assert!(editor.forest().children(&a).unwrap().is_empty());
    assert_eq!(
        editor.forest().children(&root).unwrap(),
        &[a.clone(), b.clone()]
    );

    editor.undo();
    assert_eq!(editor.forest().children(&a).unwrap(), &[b]);
    editor.undo();
    assert!(editor.forest().children(&a).unwrap().is_empty());
    editor.undo();
    assert_eq!(editor.forest(), &initial);
    assert!(editor.forest().children(&root).unwrap().is_empty());
}

#[test]
fn test_long_mixed_sequence_unwinds_to_start() {
    let mut editor = MapEditor::new();
    let root = root_of(&editor);
    let initial = editor.forest().clone();

    let a = editor.add_child_named(&root, "A").unwrap();
    editor.rename_node(&a, "Alpha").unwrap();
    editor.set_color(&a, "green").unwrap();
    let b = editor.add_sibling_named(&a, "B").unwrap();
    editor.move_as_child(&b, Some(&a)).unwrap();
    editor.delete_subtree(&a).unwrap();

    while editor.can_undo() {
        assert_eq!(editor.undo(), UndoOutcome::Applied);
    }
    assert_eq!(editor.forest(), &initial);
    editor.forest().check_invariants().unwrap();
}
