use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::kernel::container::{Container, ServiceKey};
use crate::kernel::error::Error;

#[derive(Debug, PartialEq)]
struct Mailer {
    host: String,
}

#[test]
fn test_unknown_key_is_unresolvable() {
    let mut container = Container::new();
    let err = container.resolve(&ServiceKey::from("nothing")).unwrap_err();
    assert!(matches!(err, Error::UnresolvableBinding { ref key } if key == "nothing"));
    assert!(err.to_string().contains("[nothing]"));
}

#[test]
fn test_bind_is_lazy_and_singleton() {
    let mut container = Container::new();
    let built = Arc::new(AtomicUsize::new(0));
    let counter = built.clone();

    container.bind("mailer", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Mailer { host: "localhost".into() })
    });
    assert_eq!(built.load(Ordering::SeqCst), 0, "binding must not run eagerly");

    let key = ServiceKey::from("mailer");
    let first = container.make::<Mailer>(&key).expect("first resolve");
    let second = container.make::<Mailer>(&key).expect("second resolve");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(built.load(Ordering::SeqCst), 1);
    assert_eq!(first.host, "localhost");
}

#[test]
fn test_bind_after_resolution_is_ignored() {
    let mut container = Container::new();
    container.bind("mailer", |_| Ok(Mailer { host: "first".into() }));
    let key = ServiceKey::from("mailer");
    container.make::<Mailer>(&key).expect("resolve");

    assert!(!container.bind("mailer", |_| Ok(Mailer { host: "second".into() })));
    assert_eq!(container.make::<Mailer>(&key).expect("resolve").host, "first");
}

#[test]
fn test_instance_replaces_pending_binding() {
    let mut container = Container::new();
    container.bind("mailer", |_| -> crate::kernel::error::Result<Mailer> {
        panic!("factory must not run")
    });
    let installed = container.instance("mailer", Mailer { host: "direct".into() });

    let resolved = container.make::<Mailer>(&ServiceKey::from("mailer")).expect("resolve");
    assert!(Arc::ptr_eq(&installed, &resolved));
}

#[test]
fn test_factory_can_resolve_dependencies() {
    let mut container = Container::new();
    container.instance("mail.host", "smtp.example.com".to_string());
    container.bind("mailer", |c| {
        let host = c.make::<String>(&ServiceKey::from("mail.host"))?;
        Ok(Mailer { host: host.as_ref().clone() })
    });

    let mailer = container.make::<Mailer>(&ServiceKey::from("mailer")).expect("resolve");
    assert_eq!(mailer.host, "smtp.example.com");
}

#[test]
fn test_failed_factory_leaves_key_unresolvable() {
    let mut container = Container::new();
    container.bind("broken", |_| -> crate::kernel::error::Result<Mailer> {
        Err(Error::Configuration("missing host".into()))
    });

    let key = ServiceKey::from("broken");
    assert!(matches!(container.resolve(&key), Err(Error::Configuration(_))));
    let err = container.resolve(&key).unwrap_err();
    assert!(matches!(err, Error::BindingFailed { ref key } if key == "broken"));
    assert!(err.to_string().contains("factory failed"));
    assert!(!container.bound(&key));

    // a fresh binding replaces the failed one
    container.bind("broken", |_| Ok(Mailer { host: "fixed".into() }));
    assert_eq!(container.make::<Mailer>(&key).expect("resolve").host, "fixed");
}

#[test]
fn test_type_mismatch() {
    let mut container = Container::new();
    container.instance("mailer", 42u32);
    let err = container.make::<Mailer>(&ServiceKey::from("mailer")).unwrap_err();
    assert!(matches!(err, Error::BindingTypeMismatch { ref key, .. } if key == "mailer"));
}

#[test]
fn test_alias_chain_resolves_to_canonical() {
    let mut container = Container::new();
    container.instance("mailer", Mailer { host: "h".into() });
    container.alias("mail", "mailer").expect("alias");
    container.alias("postman", "mail").expect("alias");
    container.alias(ServiceKey::of_type::<Mailer>(), "mailer").expect("alias");

    assert_eq!(
        container.canonical(&ServiceKey::from("postman")).expect("canonical"),
        ServiceKey::from("mailer")
    );
    let by_alias = container.make::<Mailer>(&ServiceKey::from("postman")).expect("resolve");
    let by_type = container.make::<Mailer>(&ServiceKey::of_type::<Mailer>()).expect("resolve");
    assert!(Arc::ptr_eq(&by_alias, &by_type));
}

#[test]
fn test_cyclic_alias_is_configuration_error() {
    let mut container = Container::new();
    container.alias("a", "b").expect("alias");
    container.alias("b", "c").expect("alias");

    assert!(matches!(container.alias("c", "a"), Err(Error::Configuration(_))));
    assert!(matches!(container.alias("self", "self"), Err(Error::Configuration(_))));
    // the rejected alias is not recorded
    assert!(container.canonical(&ServiceKey::from("c")).is_ok());
}

#[test]
fn test_bound_resolved_and_forget() {
    let mut container = Container::new();
    let key = ServiceKey::from("mailer");
    container.bind("mailer", |_| Ok(Mailer { host: "h".into() }));

    assert!(container.bound(&key));
    assert!(!container.resolved(&key));
    container.resolve(&key).expect("resolve");
    assert!(container.resolved(&key));

    assert!(container.forget_instance(&key).is_some());
    assert!(!container.bound(&key));
}

#[test]
fn test_flush_clears_everything() {
    let mut container = Container::new();
    container.instance("a", 1u8);
    container.bind("b", |_| Ok(2u8));
    container.alias("c", "a").expect("alias");

    container.flush();

    assert!(container.keys().is_empty());
    assert!(matches!(
        container.resolve(&ServiceKey::from("c")),
        Err(Error::UnresolvableBinding { ref key }) if key == "c"
    ));
}

#[test]
fn test_instance_under_alias_name_replaces_alias() {
    let mut container = Container::new();
    container.alias("mail", "mailer").expect("alias");
    container.instance("mail", 42u32);

    let key = ServiceKey::from("mail");
    assert_eq!(container.canonical(&key).expect("canonical"), key);
    assert_eq!(*container.make::<u32>(&key).expect("resolve"), 42);
    assert!(!container.bound(&ServiceKey::from("mailer")));
}

#[test]
fn test_bind_under_alias_name_replaces_alias() {
    let mut container = Container::new();
    container.instance("mailer", Mailer { host: "original".into() });
    container.alias(ServiceKey::of_type::<Mailer>(), "mailer").expect("alias");
    container.bind(ServiceKey::of_type::<Mailer>(), |_| Ok(Mailer { host: "typed".into() }));

    let typed = container.make::<Mailer>(&ServiceKey::of_type::<Mailer>()).expect("resolve");
    let tagged = container.make::<Mailer>(&ServiceKey::from("mailer")).expect("resolve");
    assert_eq!(typed.host, "typed");
    assert_eq!(tagged.host, "original");
}
