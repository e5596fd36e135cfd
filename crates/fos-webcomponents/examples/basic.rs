//! Register an element type, watch the body, and drive the event loop.
//!
//! Run with `RUST_LOG=fos_webcomponents=debug` to see upgrades and delivery
//! passes.

use fos_webcomponents::{
    ElementOptions, Lifecycle, MutationObserver, MutationObserverInit, Prototype, ReadyState, Realm,
};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut realm = Realm::default();
    let body = realm.document().body();

    let greeting = realm.create_element("x-greeting");
    realm.set_attribute(greeting, "name", "world")?;
    realm.append_child(body, greeting)?;

    realm.register_element(
        "x-greeting",
        ElementOptions::new()
            .prototype(Prototype::new().with_method("render", |realm, el, _| {
                let name = realm.get_attribute(el, "name").unwrap_or("stranger").to_string();
                Ok(Some(format!("Hello, {name}!")))
            }))
            .lifecycle(
                Lifecycle::new()
                    .on_attached(|realm, el| {
                        println!("attached: {:?}", realm.invoke(el, "render", &[])?);
                        Ok(())
                    })
                    .on_attribute_changed(|_, _, change| {
                        println!("{} changed: {:?} -> {:?}", change.name, change.old_value, change.new_value);
                        Ok(())
                    }),
            ),
    )?;

    let observer = MutationObserver::new(&mut realm, |_, records, _| {
        for record in records {
            println!("{:?} on {:?}", record.mutation_type, record.target);
        }
        Ok(())
    });
    observer.observe(&mut realm, body, MutationObserverInit::attributes().with_subtree())?;

    realm.on_ready(|_| {
        println!("ready");
        Ok(())
    });
    realm.set_ready_state(ReadyState::Complete);
    realm.run_until_idle();

    realm.set_attribute(greeting, "name", "fOS")?;
    realm.run_until_idle();

    for error in realm.take_unhandled_errors() {
        eprintln!("{:?}: {:#}", error.source, error.error);
    }
    Ok(())
}
