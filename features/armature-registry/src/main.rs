use std::sync::Arc;

use armature_registry::{Instance, SingletonRegistry};

fn main() {
    let registry = SingletonRegistry::new();

    registry
        .register_singleton("greeting", Arc::new("hello".to_string()))
        .unwrap();

    registry.add_singleton_callback("counter", |instance| {
        println!("counter came up as a {}", instance.info.type_name);
    });

    let counter = registry
        .get_or_create("counter", || Ok(Instance::new(0u64)))
        .unwrap();

    println!("{:?}", registry);
    println!(
        "counter is bound: {}",
        registry.get_singleton("counter").unwrap().ptr_eq(&counter)
    );

    registry.destroy_singletons().unwrap();
    println!("{} singletons left after teardown", registry.singleton_count());
}
