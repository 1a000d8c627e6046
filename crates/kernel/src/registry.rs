use anyhow::Context;
use std::future::Future;
use std::sync::Arc;

use crate::module::{InitCtx, Module};

/// Core module startup order. Shutdown walks it in reverse, after every
/// custom module has stopped.
const CORE_MODULE_ORDER: &[&str] = &[
    "db", // Storage gateway; everything else queries through it
];

/// Module registry for managing module lifecycle with core/custom separation
pub struct ModuleRegistry {
    core_modules: Vec<Arc<dyn Module>>,
    custom_modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self {
            core_modules: Vec::new(),
            custom_modules: Vec::new(),
        }
    }

    /// Register a core module. Names outside the known core order are ignored
    /// by the lifecycle methods, so they are rejected here.
    pub fn register_core(&mut self, module: Arc<dyn Module>) -> anyhow::Result<()> {
        if !CORE_MODULE_ORDER.contains(&module.name()) {
            anyhow::bail!("'{}' is not a known core module", module.name());
        }
        self.core_modules.push(module);
        Ok(())
    }

    pub fn register_custom(&mut self, module: Arc<dyn Module>) {
        self.custom_modules.push(module);
    }

    /// All registered modules, core first
    pub fn modules(&self) -> Vec<&Arc<dyn Module>> {
        self.core_modules
            .iter()
            .chain(self.custom_modules.iter())
            .collect()
    }

    fn ordered_core(&self) -> impl DoubleEndedIterator<Item = &Arc<dyn Module>> + '_ {
        CORE_MODULE_ORDER.iter().filter_map(|&name| {
            self.core_modules
                .iter()
                .find(|module| module.name() == name)
        })
    }

    /// Initialize core modules in order, then custom modules
    pub async fn init_all(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        for module in self.ordered_core().chain(self.custom_modules.iter()) {
            tracing::info!(module = module.name(), "initializing module");
            module
                .init(ctx)
                .await
                .with_context(|| format!("failed to initialize module '{}'", module.name()))?;
        }
        Ok(())
    }

    /// Start core modules in order, then custom modules
    pub async fn start_all(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        for module in self.ordered_core().chain(self.custom_modules.iter()) {
            tracing::info!(module = module.name(), "starting module");
            module
                .start(ctx)
                .await
                .with_context(|| format!("failed to start module '{}'", module.name()))?;
        }
        Ok(())
    }

    /// Stop custom modules in reverse registration order, then core modules
    /// in reverse core order. Every module is asked to stop even if an earlier
    /// one fails; the first failure is returned.
    pub async fn stop_all(&self) -> anyhow::Result<()> {
        let mut first_error = None;

        for module in self
            .custom_modules
            .iter()
            .rev()
            .chain(self.ordered_core().rev())
        {
            tracing::info!(module = module.name(), "stopping module");
            if let Err(err) = module.stop().await {
                tracing::error!(module = module.name(), error = %err, "module failed to stop");
                first_error.get_or_insert_with(|| {
                    err.context(format!("failed to stop module '{}'", module.name()))
                });
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Initialize and start every module, await `serve`, then stop every
    /// module. Stop runs even when init, start or `serve` fail; their error
    /// takes precedence over a stop failure.
    pub async fn run<F>(&self, ctx: &InitCtx<'_>, serve: F) -> anyhow::Result<()>
    where
        F: Future<Output = anyhow::Result<()>>,
    {
        let served = async {
            self.init_all(ctx).await?;
            self.start_all(ctx).await?;
            serve.await
        }
        .await;
        let stopped = self.stop_all().await;

        served?;
        stopped
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use std::sync::Mutex;

    struct RecordingModule {
        name: &'static str,
        journal: Arc<Mutex<Vec<String>>>,
        fail_start: bool,
        fail_stop: bool,
    }

    impl RecordingModule {
        fn new(name: &'static str, journal: &Arc<Mutex<Vec<String>>>) -> Arc<Self> {
            Arc::new(Self {
                name,
                journal: Arc::clone(journal),
                fail_start: false,
                fail_stop: false,
            })
        }

        fn record(&self, event: &str) {
            self.journal
                .lock()
                .unwrap()
                .push(format!("{}:{}", event, self.name));
        }
    }

    #[async_trait::async_trait]
    impl Module for RecordingModule {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
            self.record("init");
            Ok(())
        }

        async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
            self.record("start");
            if self.fail_start {
                anyhow::bail!("start failed");
            }
            Ok(())
        }

        async fn stop(&self) -> anyhow::Result<()> {
            self.record("stop");
            if self.fail_stop {
                anyhow::bail!("stop failed");
            }
            Ok(())
        }
    }

    #[test]
    fn empty_registry_has_no_modules() {
        let registry = ModuleRegistry::new();
        assert!(registry.modules().is_empty());
    }

    #[test]
    fn unknown_core_module_is_rejected() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        assert!(registry
            .register_core(RecordingModule::new("books", &journal))
            .is_err());
    }

    #[tokio::test]
    async fn lifecycle_runs_core_first_and_stops_it_last() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        registry.register_custom(RecordingModule::new("books", &journal));
        registry
            .register_core(RecordingModule::new("db", &journal))
            .unwrap();

        let settings = Settings::default();
        let ctx = InitCtx {
            settings: &settings,
        };

        registry.init_all(&ctx).await.unwrap();
        registry.start_all(&ctx).await.unwrap();
        registry.stop_all().await.unwrap();

        let events = journal.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                "init:db",
                "init:books",
                "start:db",
                "start:books",
                "stop:books",
                "stop:db",
            ]
        );
    }

    #[tokio::test]
    async fn stop_continues_past_failures() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        registry.register_custom(Arc::new(RecordingModule {
            name: "books",
            journal: Arc::clone(&journal),
            fail_start: false,
            fail_stop: true,
        }));
        registry
            .register_core(RecordingModule::new("db", &journal))
            .unwrap();

        let err = registry.stop_all().await.unwrap_err();
        assert!(err.to_string().contains("books"));

        let events = journal.lock().unwrap().clone();
        assert_eq!(events, vec!["stop:books", "stop:db"]);
    }

    #[tokio::test]
    async fn run_stops_every_module_when_start_fails() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        registry.register_custom(Arc::new(RecordingModule {
            name: "books",
            journal: Arc::clone(&journal),
            fail_start: true,
            fail_stop: false,
        }));
        registry
            .register_core(RecordingModule::new("db", &journal))
            .unwrap();

        let settings = Settings::default();
        let ctx = InitCtx {
            settings: &settings,
        };

        let served = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&served);
        let err = registry
            .run(&ctx, async move {
                *flag.lock().unwrap() = true;
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("books"));
        assert!(!*served.lock().unwrap());
        let events = journal.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                "init:db",
                "init:books",
                "start:db",
                "start:books",
                "stop:books",
                "stop:db",
            ]
        );
    }

    #[tokio::test]
    async fn run_serves_between_start_and_stop() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        registry
            .register_core(RecordingModule::new("db", &journal))
            .unwrap();

        let settings = Settings::default();
        let ctx = InitCtx {
            settings: &settings,
        };

        let serve_journal = Arc::clone(&journal);
        registry
            .run(&ctx, async move {
                serve_journal.lock().unwrap().push("serve".to_string());
                Ok(())
            })
            .await
            .unwrap();

        let events = journal.lock().unwrap().clone();
        assert_eq!(events, vec!["init:db", "start:db", "serve", "stop:db"]);
    }
}
