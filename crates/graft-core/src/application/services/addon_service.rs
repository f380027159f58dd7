//! Addon Service - main application orchestrator.
//!
//! Coordinates one `graft add` run:
//! 1. Resolve every selected addon's options (nothing is written on failure)
//! 2. Run `setup`, pulling in addons the selection depends on
//! 3. Run the supported addons in catalog order, dependencies first
//! 4. Merge recorded dependencies into `package.json`
//!
//! There is no cross-file rollback: when an addon fails, files written
//! before the failure stay on disk.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{
    application::{
        ApplicationError,
        ports::{
            Addon, AddonCatalog, Filesystem,
            addon::{RunContext, SetupContext},
        },
        services::patch_service::{PatchRecord, PatchService},
    },
    domain::{Dependency, DependencyKind, DomainError, OptionSchema, OptionValues, Workspace},
    error::GraftResult,
    tooling::{EditResult, json},
};

/// Information about an addon for display purposes.
#[derive(Debug, Clone, Serialize)]
pub struct AddonInfo {
    pub id: String,
    pub description: String,
    pub homepage: String,
    pub options: OptionSchema,
}

/// One addon the user asked for, with raw option input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddonRequest {
    pub id: String,
    pub options: BTreeMap<String, String>,
}

impl AddonRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            options: BTreeMap::new(),
        }
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// One request per id (duplicates collapse) with `addon.key=value`
    /// arguments routed to their addon.
    pub fn from_args(ids: &[String], options: &[String]) -> Result<Vec<Self>, DomainError> {
        let mut requests: Vec<Self> = Vec::with_capacity(ids.len());
        for id in ids {
            if !requests.iter().any(|r| &r.id == id) {
                requests.push(Self::new(id.as_str()));
            }
        }
        for arg in options {
            let (target, value) = arg
                .split_once('=')
                .ok_or_else(|| DomainError::MalformedOption(arg.clone()))?;
            let (addon, key) = target
                .split_once('.')
                .filter(|(addon, key)| !addon.is_empty() && !key.is_empty())
                .ok_or_else(|| DomainError::MalformedOption(arg.clone()))?;
            let request = requests.iter_mut().find(|r| r.id == addon).ok_or_else(|| {
                DomainError::InvalidOption {
                    addon: addon.to_owned(),
                    option: key.to_owned(),
                    reason: format!("'{addon}' is not one of the selected addons"),
                }
            })?;
            request.options.insert(key.to_owned(), value.to_owned());
        }
        Ok(requests)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AddonStatus {
    Applied,
    Skipped { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct AddonOutcome {
    pub id: String,
    #[serde(flatten)]
    pub status: AddonStatus,
    pub files: Vec<PatchRecord>,
    pub dependencies: Vec<Dependency>,
    pub next_steps: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    pub dry_run: bool,
    pub addons: Vec<AddonOutcome>,
}

impl ApplyReport {
    pub fn applied(&self) -> impl Iterator<Item = &AddonOutcome> {
        self.addons
            .iter()
            .filter(|a| a.status == AddonStatus::Applied)
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&str, &str)> {
        self.addons.iter().filter_map(|a| match &a.status {
            AddonStatus::Skipped { reason } => Some((a.id.as_str(), reason.as_str())),
            AddonStatus::Applied => None,
        })
    }
}

/// A resolved addon, ready to run or to be reported as skipped.
struct Step<'c> {
    addon: &'c dyn Addon,
    options: OptionValues,
    skip: Option<String>,
}

pub struct AddonService {
    catalog: Box<dyn AddonCatalog>,
    filesystem: Arc<dyn Filesystem>,
}

impl AddonService {
    pub fn new(catalog: Box<dyn AddonCatalog>, filesystem: Arc<dyn Filesystem>) -> Self {
        Self {
            catalog,
            filesystem,
        }
    }

    /// List all available addons.
    pub fn list(&self) -> Vec<AddonInfo> {
        self.catalog
            .list()
            .into_iter()
            .map(|addon| AddonInfo {
                id: addon.id().to_string(),
                description: addon.short_description().to_string(),
                homepage: addon.homepage().to_string(),
                options: addon.options(),
            })
            .collect()
    }

    /// Apply `requests` to the project described by `workspace`.
    #[instrument(
        skip_all,
        fields(
            cwd = %workspace.cwd().display(),
            addons = requests.len(),
            dry_run = dry_run
        )
    )]
    pub fn apply(
        &self,
        workspace: &Workspace,
        requests: &[AddonRequest],
        dry_run: bool,
    ) -> GraftResult<ApplyReport> {
        info!("Applying addons to {}", workspace);

        let plan = self.plan(workspace, requests)?;
        let mut patches =
            PatchService::new(Arc::clone(&self.filesystem), workspace.cwd()).dry_run(dry_run);
        let mut current = workspace.clone();
        let mut outcomes = Vec::with_capacity(plan.len());

        for step in plan {
            let id = step.addon.id();
            if let Some(reason) = step.skip {
                warn!(addon = id, %reason, "Skipping addon");
                outcomes.push(AddonOutcome {
                    id: id.to_string(),
                    status: AddonStatus::Skipped { reason },
                    files: Vec::new(),
                    dependencies: Vec::new(),
                    next_steps: Vec::new(),
                });
                continue;
            }

            let scoped = current.with_options(step.options);
            let mut cx = RunContext::new(&scoped, &mut patches);
            if let Err(e) = step.addon.run(&mut cx) {
                warn!(addon = id, error = %e, "Addon failed, earlier files were kept");
                return Err(e);
            }
            let dependencies = cx.into_dependencies();

            if !dependencies.is_empty() {
                patches.file("package.json", |content| {
                    merge_dependencies(content, &dependencies)
                })?;
            }

            let files = patches.take_records();
            info!(addon = id, files = files.len(), "Addon applied");
            current = current.with_dependencies(&dependencies);
            outcomes.push(AddonOutcome {
                id: id.to_string(),
                status: AddonStatus::Applied,
                files,
                next_steps: step.addon.next_steps(&scoped),
                dependencies,
            });
        }

        Ok(ApplyReport {
            dry_run,
            addons: outcomes,
        })
    }

    // -------------------------------------------------------------------------
    // Internal Helpers
    // -------------------------------------------------------------------------

    /// Validate the selection and order it; touches no files.
    fn plan(&self, workspace: &Workspace, requests: &[AddonRequest]) -> GraftResult<Vec<Step<'_>>> {
        let mut selected: HashMap<&'static str, OptionValues> = HashMap::new();
        for request in requests {
            let addon = self
                .catalog
                .get(&request.id)
                .ok_or_else(|| DomainError::UnknownAddon(request.id.clone()))?;
            let values = addon.options().resolve(addon.id(), &request.options)?;
            selected.insert(addon.id(), values);
        }

        let mut setups: HashMap<&'static str, SetupContext> = HashMap::new();
        let mut queue: Vec<&'static str> = selected.keys().copied().collect();
        while let Some(id) = queue.pop() {
            if setups.contains_key(id) {
                continue;
            }
            let Some(addon) = self.catalog.get(id) else {
                unreachable!("only catalog ids are queued");
            };
            let mut cx = SetupContext::new();
            let options = selected.get(id).cloned().unwrap_or_default();
            addon.setup(&workspace.with_options(options), &mut cx);

            if cx.unsupported_reason().is_none() {
                for dep in cx.dependencies() {
                    let Some(required) = self.catalog.get(dep) else {
                        return Err(ApplicationError::MissingAddon {
                            addon: id.to_string(),
                            requires: dep.clone(),
                        }
                        .into());
                    };
                    if !selected.contains_key(required.id()) {
                        let defaults = required.options().resolve(required.id(), &BTreeMap::new())?;
                        selected.insert(required.id(), defaults);
                        queue.push(required.id());
                    }
                }
            }
            setups.insert(id, cx);
        }

        let mut order = Vec::new();
        let mut visited = HashSet::new();
        for addon in self.catalog.list() {
            if selected.contains_key(addon.id()) {
                visit(addon.id(), &setups, &mut visited, &mut order);
            }
        }

        let mut skipped: HashSet<&str> = HashSet::new();
        let mut steps = Vec::with_capacity(order.len());
        for id in order {
            let Some(addon) = self.catalog.get(id) else {
                unreachable!("only catalog ids are ordered");
            };
            let setup = &setups[id];
            let skip = setup.unsupported_reason().map(str::to_owned).or_else(|| {
                setup
                    .dependencies()
                    .iter()
                    .find(|dep| skipped.contains(dep.as_str()))
                    .map(|dep| format!("requires '{dep}', which was skipped"))
            });
            if skip.is_some() {
                skipped.insert(id);
            }
            steps.push(Step {
                addon,
                options: selected.remove(id).unwrap_or_default(),
                skip,
            });
        }
        Ok(steps)
    }
}

/// Depth-first: dependencies land before their dependents.
fn visit(
    id: &'static str,
    setups: &HashMap<&'static str, SetupContext>,
    visited: &mut HashSet<&'static str>,
    order: &mut Vec<&'static str>,
) {
    if !visited.insert(id) {
        return;
    }
    if let Some(setup) = setups.get(id) {
        for dep in setup.dependencies() {
            if let Some((&dep_id, _)) = setups.get_key_value(dep.as_str()) {
                visit(dep_id, setups, visited, order);
            }
        }
    }
    order.push(id);
}

/// Add `dependencies` to a `package.json` without touching packages that
/// are already declared in either table.
pub fn merge_dependencies(content: &str, dependencies: &[Dependency]) -> EditResult<String> {
    let mut doc = json::parse_json(content)?;
    for dep in dependencies {
        let declared = [DependencyKind::Dependencies, DependencyKind::DevDependencies]
            .iter()
            .any(|kind| {
                doc.data
                    .get(kind.manifest_key())
                    .and_then(|table| table.get(&dep.name))
                    .is_some()
            });
        if declared {
            continue;
        }
        let table = json::object_entry(&mut doc.data, dep.kind.manifest_key())?;
        json::set_default(table, &dep.name, dep.range.as_str());
    }
    Ok(doc.generate())
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use super::*;
    use crate::error::{GraftError, GraftResult};
    use crate::tooling::js::{self, exports, object};

    #[derive(Default)]
    struct FakeFs(Mutex<HashMap<PathBuf, String>>);

    impl FakeFs {
        fn with(files: &[(&str, &str)]) -> Arc<Self> {
            let fs = Self::default();
            for (path, content) in files {
                fs.0.lock()
                    .unwrap()
                    .insert(Path::new("/app").join(path), (*content).to_string());
            }
            Arc::new(fs)
        }

        fn get(&self, path: &str) -> Option<String> {
            self.0.lock().unwrap().get(&Path::new("/app").join(path)).cloned()
        }
    }

    impl Filesystem for FakeFs {
        fn read_file(&self, path: &Path) -> GraftResult<Option<String>> {
            Ok(self.0.lock().unwrap().get(path).cloned())
        }
        fn write_file(&self, path: &Path, content: &str) -> GraftResult<()> {
            self.0.lock().unwrap().insert(path.to_path_buf(), content.to_string());
            Ok(())
        }
        fn create_dir_all(&self, _path: &Path) -> GraftResult<()> {
            Ok(())
        }
        fn exists(&self, path: &Path) -> bool {
            self.0.lock().unwrap().contains_key(path)
        }
    }

    struct Formatter;

    impl Addon for Formatter {
        fn id(&self) -> &'static str {
            "formatter"
        }
        fn short_description(&self) -> &'static str {
            "format"
        }
        fn homepage(&self) -> &'static str {
            "https://example.test"
        }
        fn options(&self) -> OptionSchema {
            OptionSchema::new().boolean("semi", "Use semicolons?", false)
        }
        fn run(&self, cx: &mut RunContext<'_>) -> GraftResult<()> {
            let semi = cx.options().flag("semi");
            cx.dev_dependency("formatter", "^1.0.0");
            cx.file("formatter.config.js", |content| {
                let mut doc = js::parse_script(content)?;
                let config = exports::object_default_export(&mut doc.ast)?;
                object::override_property(config.value, "semi", js::common::create_literal(semi))?;
                Ok(doc.generate())
            })?;
            Ok(())
        }
        fn next_steps(&self, _workspace: &Workspace) -> Vec<String> {
            vec!["Run the formatter".into()]
        }
    }

    struct Auth;

    impl Addon for Auth {
        fn id(&self) -> &'static str {
            "auth"
        }
        fn short_description(&self) -> &'static str {
            "auth"
        }
        fn homepage(&self) -> &'static str {
            "https://example.test"
        }
        fn setup(&self, workspace: &Workspace, cx: &mut SetupContext) {
            if workspace.kit().is_none() {
                cx.unsupported("Requires SolidStart");
            }
            cx.depends_on("formatter");
        }
        fn run(&self, cx: &mut RunContext<'_>) -> GraftResult<()> {
            let has_formatter = cx.workspace().has_dependency("formatter");
            cx.dependency("auth-lib", "^2.0.0");
            cx.file("auth.txt", |_| Ok(format!("formatter: {has_formatter}\n")))?;
            Ok(())
        }
    }

    struct Catalog(Vec<Box<dyn Addon>>);

    impl AddonCatalog for Catalog {
        fn list(&self) -> Vec<&dyn Addon> {
            self.0.iter().map(|a| a.as_ref()).collect()
        }
    }

    fn service(fs: Arc<FakeFs>, addons: Vec<Box<dyn Addon>>) -> AddonService {
        AddonService::new(Box::new(Catalog(addons)), fs)
    }

    fn kit_workspace() -> Workspace {
        Workspace::builder("/app")
            .kit(crate::domain::KitInfo::default())
            .build()
    }

    #[test]
    fn applies_and_merges_dependencies() {
        let fs = FakeFs::with(&[("package.json", "{\n  \"name\": \"app\"\n}\n")]);
        let svc = service(fs.clone(), vec![Box::new(Formatter)]);

        let report = svc
            .apply(
                &kit_workspace(),
                &[AddonRequest::new("formatter").option("semi", "yes")],
                false,
            )
            .unwrap();

        assert_eq!(report.applied().count(), 1);
        assert_eq!(
            fs.get("formatter.config.js").unwrap(),
            "export default {\n\tsemi: true\n};\n"
        );
        assert_eq!(
            fs.get("package.json").unwrap(),
            "{\n  \"name\": \"app\",\n  \"devDependencies\": {\n    \"formatter\": \"^1.0.0\"\n  }\n}\n"
        );
        assert_eq!(report.addons[0].next_steps, ["Run the formatter".to_string()]);
    }

    #[test]
    fn second_run_changes_nothing() {
        let fs = FakeFs::with(&[("package.json", "{}\n")]);
        let svc = service(fs.clone(), vec![Box::new(Formatter)]);
        let requests = [AddonRequest::new("formatter")];

        svc.apply(&kit_workspace(), &requests, false).unwrap();
        let config = fs.get("formatter.config.js");
        let report = svc.apply(&kit_workspace(), &requests, false).unwrap();

        assert_eq!(fs.get("formatter.config.js"), config);
        assert!(report.addons[0]
            .files
            .iter()
            .all(|f| f.status == crate::application::services::PatchStatus::Unchanged));
    }

    #[test]
    fn dependencies_are_pulled_in_and_run_first() {
        let fs = FakeFs::with(&[]);
        let svc = service(fs.clone(), vec![Box::new(Auth), Box::new(Formatter)]);

        let report = svc
            .apply(&kit_workspace(), &[AddonRequest::new("auth")], false)
            .unwrap();

        let ids: Vec<_> = report.addons.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["formatter", "auth"]);
        assert_eq!(fs.get("auth.txt").unwrap(), "formatter: true\n");
    }

    #[test]
    fn unsupported_addons_are_skipped() {
        let fs = FakeFs::with(&[]);
        let svc = service(fs.clone(), vec![Box::new(Auth), Box::new(Formatter)]);

        let report = svc
            .apply(&Workspace::builder("/app").build(), &[AddonRequest::new("auth")], false)
            .unwrap();

        assert_eq!(report.skipped().collect::<Vec<_>>(), [("auth", "Requires SolidStart")]);
        assert!(fs.get("auth.txt").is_none());
    }

    #[test]
    fn missing_dependency_addon_fails_before_writing() {
        let fs = FakeFs::with(&[]);
        let svc = service(fs.clone(), vec![Box::new(Auth)]);

        let err = svc
            .apply(&kit_workspace(), &[AddonRequest::new("auth")], false)
            .unwrap_err();
        assert!(matches!(
            err,
            GraftError::Application(ApplicationError::MissingAddon { .. })
        ));
        assert!(fs.0.lock().unwrap().is_empty());
    }

    #[test]
    fn invalid_options_fail_before_writing() {
        let fs = FakeFs::with(&[]);
        let svc = service(fs.clone(), vec![Box::new(Formatter)]);

        let err = svc
            .apply(
                &kit_workspace(),
                &[AddonRequest::new("formatter").option("tabs", "yes")],
                false,
            )
            .unwrap_err();
        assert!(matches!(err, GraftError::Domain(DomainError::UnknownOption { .. })));
        assert!(fs.get("formatter.config.js").is_none());
    }

    #[test]
    fn dry_run_writes_nothing() {
        let fs = FakeFs::with(&[]);
        let svc = service(fs.clone(), vec![Box::new(Formatter)]);

        let report = svc
            .apply(&kit_workspace(), &[AddonRequest::new("formatter")], true)
            .unwrap();
        assert!(report.dry_run);
        assert_eq!(report.addons[0].files.len(), 2);
        assert!(fs.0.lock().unwrap().is_empty());
    }

    #[test]
    fn option_arguments_are_routed_to_their_addon() {
        let ids = ["paraglide".to_string(), "prettier".into(), "paraglide".into()];
        let options = ["paraglide.availableLanguageTags=en,de=x".to_string()];
        let requests = AddonRequest::from_args(&ids, &options).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].options["availableLanguageTags"], "en,de=x");
        assert!(requests[1].options.is_empty());

        for bad in ["paraglide", "paraglide=en", ".key=v", "paraglide.=v"] {
            assert!(matches!(
                AddonRequest::from_args(&ids, &[bad.to_string()]),
                Err(DomainError::MalformedOption(_))
            ));
        }
        assert!(matches!(
            AddonRequest::from_args(&ids, &["lucia.demo=false".to_string()]),
            Err(DomainError::InvalidOption { .. })
        ));
    }

    #[test]
    fn existing_declarations_are_kept() {
        let deps = [Dependency {
            name: "prettier".into(),
            range: "^3.3.2".into(),
            kind: DependencyKind::DevDependencies,
        }];
        let input = "{\n\t\"dependencies\": {\n\t\t\"prettier\": \"^2.0.0\"\n\t}\n}\n";
        assert_eq!(merge_dependencies(input, &deps).unwrap(), input);
    }
}
