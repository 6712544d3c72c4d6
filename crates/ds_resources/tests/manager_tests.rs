use ds_resources::{ResourceClass, ResourceManager};

#[test]
fn resources_created_outside_a_context_are_rejected() {
    let manager = ResourceManager::new("integration", 2);
    std::thread::spawn(move || {
        assert!(manager.track_create(ResourceClass::Buffer).is_err());
    })
    .join()
    .unwrap();
}

#[test]
fn a_bound_context_allows_tracking_and_releases_on_drop() {
    let manager = ResourceManager::new("integration", 2);
    std::thread::spawn(move || {
        {
            let _ctx = manager.create_resource_context().unwrap();
            manager.track_create(ResourceClass::Texture).unwrap();
            manager.track_create(ResourceClass::Texture).unwrap();
            manager.track_destroy(ResourceClass::Texture);
        }
        assert!(!manager.can_use_resources());
        // report_leaks should not panic even with a live counter.
        manager.report_leaks();
    })
    .join()
    .unwrap();
}
