use std::sync::Arc;

use ds_scene::lists::{FullScreenResolve, HandoffList, TransformData};
use ds_scene::{ItemListType, Scene, SceneNode};

#[test]
fn full_pipeline_add_update_commit() {
    let mut scene = Scene::new();
    scene.add_item_list(Box::new(TransformData::new("transformData")));
    scene.add_item_list(Box::new(HandoffList::new("handoff", 0.25)));
    scene.add_item_list(Box::new(FullScreenResolve::new("resolve")));

    let node = SceneNode::new(
        "thing",
        vec!["transformData".into(), "handoff".into()],
    );
    let tree_node = scene.add_node(None, node);
    tree_node.set_local_transform(glam::Mat4::from_translation(glam::Vec3::new(
        1.0, 2.0, 3.0,
    )));

    scene.run_frame(1.0 / 60.0);

    let transform_data = scene.item_list("transformData").unwrap();
    assert_eq!(transform_data.name(), "transformData");

    scene.remove_node(&tree_node);
    scene.run_frame(1.0 / 60.0);
    assert!(scene.root().children().is_empty());
}

#[test]
fn reparenting_preserves_node_identity() {
    let mut scene = Scene::new();
    scene.add_item_list(Box::new(HandoffList::new("handoff", 0.1)));

    let a = scene.add_node(None, SceneNode::new("a", vec!["handoff".into()]));
    let b = scene.add_node(None, SceneNode::new("b", vec![]));
    let child = scene.add_node(Some(&a), SceneNode::new("child", vec!["handoff".into()]));

    scene.reparent_node(&child, Some(&b));
    assert!(b.children().iter().any(|c| Arc::ptr_eq(c, &child)));
    assert!(!a.children().iter().any(|c| Arc::ptr_eq(c, &child)));
}
