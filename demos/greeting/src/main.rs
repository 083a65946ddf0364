use std::sync::{Arc, Mutex};

use herd::{inject, Bundle, Component, Container, DynError, Provided};
use herd_config::{Config, ConfigProvider};

struct GreetingConfig {
    salutation: String,
}

/// Provider of the `Greeter` service, its punctuation can be changed during config
struct GreeterSettings {
    punctuation: Mutex<char>,
}

struct Greeter {
    salutation: String,
    punctuation: char,
}

impl Greeter {
    fn greet(&self, name: &str) -> String {
        format!("{} {name}{}", self.salutation, self.punctuation)
    }
}

fn core_bundle() -> Bundle {
    Bundle::new("Core")
        .property("version", env!("CARGO_PKG_VERSION"))
        .component(Component::value("Audience", vec!["Ada", "Grace"]))
        .component(Component::provider(
            "GreeterProvider",
            inject!(|config: Config<GreetingConfig>| {
                let settings = Arc::new(GreeterSettings {
                    punctuation: Mutex::new('.'),
                });
                let state = settings.clone();
                let salutation = config.salutation.clone();

                Ok(Provided::from_arc(settings).with_getter(inject!(|| {
                    let punctuation = *state.punctuation.lock().map_err(|_| "settings lock poisoned")?;
                    Ok(Greeter {
                        salutation: salutation.clone(),
                        punctuation,
                    })
                })))
            }),
        ))
}

fn greeter_bundle() -> Bundle {
    Bundle::new("Greetings")
        .depends_on(["Core"])
        .config(inject!(|GreeterProvider: Arc<GreeterSettings>| {
            *GreeterProvider.punctuation.lock().map_err(|_| "settings lock poisoned")? = '!';
            Ok(())
        }))
        .run_async(inject!(|Greeter: Arc<Greeter>, Audience: Arc<Vec<&'static str>>| {
            Ok(async move {
                for name in Audience.iter() {
                    tracing::info!("{}", Greeter.greet(name));
                }
                Ok::<_, DynError>(())
            })
        }))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut configs = ConfigProvider::new();
    if let Err(e) = configs.add_config(GreetingConfig {
        salutation: "Hello".to_string(),
    }) {
        eprintln!("Invalid configuration: {}", e);
        return;
    }

    let mut container = Container::new();
    if let Err(e) = container.register_external(ConfigProvider::DEPENDENCY_NAME, configs) {
        eprintln!("Failed to register configuration: {}", e);
        return;
    }

    // Loaded out of order on purpose, boot still configures Core first
    let loaded = container
        .load_bundle(greeter_bundle())
        .and_then(|container| container.load_bundle(core_bundle()));
    if let Err(e) = loaded {
        eprintln!("Failed to load bundles: {}", e);
        return;
    }

    if let Ok(core) = container.bundle("Core") {
        if let Some(version) = core.get_property::<&str>("version") {
            tracing::info!("Core bundle version {version}");
        }
    }

    match futures::executor::block_on(container.boot()) {
        Ok(()) => println!("Application booted without error"),
        Err(e) => eprintln!("Application failed to boot: {}", e),
    }
}
