//! The deployment context every blueprint declares into.
//!
//! The context enforces naming rules, stamps auto-tags, hands each
//! declaration to the [`ResourceEngine`], and keeps a record of everything
//! declared so the dependency graph and plan can be derived afterwards.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use stackwright_common::config::StackwrightConfig;
use stackwright_common::error::{Result, StackwrightError};
use stackwright_common::types::{Tags, Urn};

use crate::deferred::Deferred;
use crate::engine::ResourceEngine;
use crate::graph::{DependencyGraph, EdgeKind};
use crate::input::{Input, OutputRef};
use crate::resource::{DeclaredResource, ResourceDeclaration, ResourceKind, ResourceOptions};

/// Handle to a registered component (grouping node).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentHandle {
    urn: Urn,
}

impl ComponentHandle {
    /// Identifier of the component.
    #[must_use]
    pub const fn urn(&self) -> &Urn {
        &self.urn
    }

    /// Options parenting a child declaration to this component.
    #[must_use]
    pub fn child_options(&self) -> ResourceOptions {
        ResourceOptions::parent(&self.urn)
    }
}

#[derive(Debug)]
struct ResourceRecord {
    declaration: ResourceDeclaration,
    outputs: BTreeMap<String, OutputRef>,
}

/// Records declarations for one deployment.
pub struct DeploymentContext {
    config: StackwrightConfig,
    engine: Box<dyn ResourceEngine>,
    auto_tags: Tags,
    records: Vec<ResourceRecord>,
    index: HashMap<Urn, usize>,
    scoped_names: HashSet<(Option<Urn>, String)>,
    component_outputs: BTreeMap<Urn, BTreeMap<String, Input>>,
    exports: BTreeMap<String, Input>,
}

impl fmt::Debug for DeploymentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentContext")
            .field("project", &self.config.project)
            .field("stack", &self.config.stack)
            .field("declarations", &self.records.len())
            .field("exports", &self.exports.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl DeploymentContext {
    /// Creates a context that declares into `engine`.
    #[must_use]
    pub fn new(config: StackwrightConfig, engine: Box<dyn ResourceEngine>) -> Self {
        Self {
            config,
            engine,
            auto_tags: Tags::new(),
            records: Vec::new(),
            index: HashMap::new(),
            scoped_names: HashSet::new(),
            component_outputs: BTreeMap::new(),
            exports: BTreeMap::new(),
        }
    }

    /// The configuration this deployment runs with.
    #[must_use]
    pub const fn config(&self) -> &StackwrightConfig {
        &self.config
    }

    /// Sets tags stamped onto every taggable resource declared from now on.
    ///
    /// Tags already present on a declaration take precedence.
    pub fn register_auto_tags(&mut self, tags: Tags) {
        tracing::debug!(tags = ?tags, "registering auto tags");
        self.auto_tags = tags;
    }

    /// Currently active auto-tags.
    #[must_use]
    pub const fn auto_tags(&self) -> &Tags {
        &self.auto_tags
    }

    /// Registers a component (grouping node).
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken, the parent is unknown, or the
    /// engine rejects the component.
    pub fn register_component(
        &mut self,
        token: &str,
        name: &str,
        parent: Option<&ComponentHandle>,
    ) -> Result<ComponentHandle> {
        let options = parent.map_or_else(ResourceOptions::default, ComponentHandle::child_options);
        let declared = self.declare(
            name,
            ResourceKind::Component(token.to_string()),
            std::iter::empty(),
            options,
        )?;
        tracing::info!(urn = %declared.urn, "component registered");
        Ok(ComponentHandle { urn: declared.urn })
    }

    /// Declares a resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the `(parent, name)` pair or the URN is already
    /// taken, if the parent, an explicit dependency, or a referenced output
    /// belongs to an undeclared resource, or if the engine rejects the
    /// declaration.
    pub fn declare<'a>(
        &mut self,
        name: &str,
        kind: ResourceKind,
        properties: impl IntoIterator<Item = (&'a str, Input)>,
        options: ResourceOptions,
    ) -> Result<DeclaredResource> {
        let urn = match &options.parent {
            Some(parent) => {
                self.require_known(parent)?;
                parent.child(kind.token(), name)
            }
            None => Urn::new(&self.config.stack, &self.config.project, kind.token(), name),
        };

        let scope = (options.parent.clone(), name.to_string());
        if self.index.contains_key(&urn) || self.scoped_names.contains(&scope) {
            return Err(StackwrightError::DuplicateResource {
                urn: urn.to_string(),
            });
        }
        for dependency in &options.depends_on {
            self.require_known(dependency)?;
        }

        let mut properties: BTreeMap<String, Input> = properties
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        if kind.is_taggable() && !self.auto_tags.is_empty() {
            self.apply_auto_tags(&mut properties);
        }

        let declaration = ResourceDeclaration {
            urn: urn.clone(),
            name: name.to_string(),
            kind: kind.clone(),
            properties,
            options,
        };
        for reference in declaration.references() {
            self.require_known(&reference.producer)?;
        }

        let outputs: BTreeMap<String, OutputRef> = kind
            .output_properties()
            .iter()
            .map(|property| {
                let output = OutputRef::new(urn.clone(), *property, Deferred::new());
                ((*property).to_string(), output)
            })
            .collect();

        self.engine.register_resource(&declaration, &outputs)?;
        tracing::debug!(urn = %urn, kind = %kind, "resource declared");

        let _ = self.scoped_names.insert(scope);
        let _ = self.index.insert(urn.clone(), self.records.len());
        self.records.push(ResourceRecord {
            declaration,
            outputs: outputs.clone(),
        });
        Ok(DeclaredResource::new(urn, kind, outputs))
    }

    fn apply_auto_tags(&self, properties: &mut BTreeMap<String, Input>) {
        let mut tags: BTreeMap<String, Input> = match properties.remove("tags") {
            Some(Input::Map(existing)) => existing,
            Some(other) => {
                let _ = properties.insert("tags".to_string(), other);
                return;
            }
            None => BTreeMap::new(),
        };
        for (key, value) in self.auto_tags.iter() {
            let _ = tags
                .entry(key.to_string())
                .or_insert_with(|| Input::string(value));
        }
        let _ = properties.insert("tags".to_string(), Input::Map(tags));
    }

    fn require_known(&self, urn: &Urn) -> Result<()> {
        if self.index.contains_key(urn) {
            Ok(())
        } else {
            Err(StackwrightError::UnknownResource {
                urn: urn.to_string(),
            })
        }
    }

    /// Publishes outputs on a component.
    ///
    /// Every referenced output must come from the component itself or one
    /// of its descendants.
    ///
    /// # Errors
    ///
    /// Returns [`StackwrightError::ForeignOutput`] for a reference produced
    /// outside the component's subtree, or the engine's error.
    pub fn register_outputs<'a>(
        &mut self,
        component: &ComponentHandle,
        outputs: impl IntoIterator<Item = (&'a str, Input)>,
    ) -> Result<()> {
        let outputs: BTreeMap<String, Input> = outputs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        for (name, value) in &outputs {
            for reference in value.references() {
                if !self.is_descendant_or_self(&reference.producer, component.urn()) {
                    return Err(StackwrightError::ForeignOutput {
                        component: component.urn().to_string(),
                        output: name.clone(),
                        producer: reference.producer.to_string(),
                    });
                }
            }
        }
        self.engine.register_outputs(component.urn(), &outputs)?;
        self.component_outputs
            .entry(component.urn().clone())
            .or_default()
            .extend(outputs);
        Ok(())
    }

    /// Exports a stack-level output.
    ///
    /// # Errors
    ///
    /// Returns [`StackwrightError::DuplicateExport`] if `name` was already
    /// exported, or an error if the value references an undeclared resource
    /// or the engine rejects the export.
    pub fn export(&mut self, name: &str, value: Input) -> Result<()> {
        if self.exports.contains_key(name) {
            return Err(StackwrightError::DuplicateExport {
                name: name.to_string(),
            });
        }
        for reference in value.references() {
            self.require_known(&reference.producer)?;
        }
        self.engine.export(name, &value)?;
        tracing::info!(export = name, "stack output exported");
        let _ = self.exports.insert(name.to_string(), value);
        Ok(())
    }

    /// Returns `true` if `urn` is `ancestor` or sits below it.
    #[must_use]
    pub fn is_descendant_or_self(&self, urn: &Urn, ancestor: &Urn) -> bool {
        let mut current = Some(urn);
        while let Some(candidate) = current {
            if candidate == ancestor {
                return true;
            }
            current = self
                .declaration(candidate)
                .and_then(|d| d.options.parent.as_ref());
        }
        false
    }

    /// Declarations in the order they were made.
    pub fn declarations(&self) -> impl Iterator<Item = &ResourceDeclaration> {
        self.records.iter().map(|r| &r.declaration)
    }

    /// Declarations of one kind, in declaration order.
    #[must_use]
    pub fn declarations_of(&self, kind: &ResourceKind) -> Vec<&ResourceDeclaration> {
        self.declarations().filter(|d| d.kind == *kind).collect()
    }

    /// Looks up a declaration by URN.
    #[must_use]
    pub fn declaration(&self, urn: &Urn) -> Option<&ResourceDeclaration> {
        self.index.get(urn).map(|&i| &self.records[i].declaration)
    }

    /// Looks up a declaration by logical name. Returns the first match.
    #[must_use]
    pub fn declaration_named(&self, name: &str) -> Option<&ResourceDeclaration> {
        self.declarations().find(|d| d.name == name)
    }

    /// Deferred outputs of a declaration.
    #[must_use]
    pub fn outputs_of(&self, urn: &Urn) -> Option<&BTreeMap<String, OutputRef>> {
        self.index.get(urn).map(|&i| &self.records[i].outputs)
    }

    /// Outputs published per component.
    #[must_use]
    pub const fn component_outputs(&self) -> &BTreeMap<Urn, BTreeMap<String, Input>> {
        &self.component_outputs
    }

    /// Stack-level exports.
    #[must_use]
    pub const fn exports(&self) -> &BTreeMap<String, Input> {
        &self.exports
    }

    /// Number of declarations, components included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing has been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Builds the dependency graph over every declaration.
    ///
    /// # Errors
    ///
    /// Returns an error if an edge points at an unknown declaration.
    pub fn graph(&self) -> Result<DependencyGraph> {
        let mut graph = DependencyGraph::new();
        for record in &self.records {
            let _ = graph.add_resource(&record.declaration.urn);
        }
        for record in &self.records {
            let declaration = &record.declaration;
            if let Some(parent) = &declaration.options.parent {
                graph.add_dependency(&declaration.urn, parent, EdgeKind::Parent)?;
            }
            for dependency in &declaration.options.depends_on {
                graph.add_dependency(&declaration.urn, dependency, EdgeKind::Explicit)?;
            }
            for reference in declaration.references() {
                graph.add_dependency(&declaration.urn, &reference.producer, EdgeKind::Reference)?;
            }
        }
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Default)]
    struct Recorder {
        registered: Arc<Mutex<Vec<String>>>,
        reject: Option<&'static str>,
    }

    impl ResourceEngine for Recorder {
        fn register_resource(
            &mut self,
            declaration: &ResourceDeclaration,
            _outputs: &BTreeMap<String, OutputRef>,
        ) -> Result<()> {
            if self.reject == Some(declaration.name.as_str()) {
                return Err(StackwrightError::Declaration {
                    urn: declaration.urn.to_string(),
                    message: "rejected".into(),
                });
            }
            self.registered
                .lock()
                .expect("lock")
                .push(declaration.name.clone());
            Ok(())
        }

        fn register_outputs(&mut self, _: &Urn, _: &BTreeMap<String, Input>) -> Result<()> {
            Ok(())
        }

        fn export(&mut self, _: &str, _: &Input) -> Result<()> {
            Ok(())
        }
    }

    fn context() -> DeploymentContext {
        DeploymentContext::new(StackwrightConfig::default(), Box::new(Recorder::default()))
    }

    #[test]
    fn duplicate_name_under_same_parent_conflicts() {
        let mut ctx = context();
        let root = ctx.register_component("t:api:Api", "api", None).expect("component");
        let _ = ctx
            .declare("lb", ResourceKind::LoadBalancer, [], root.child_options())
            .expect("first");
        let err = ctx
            .declare("lb", ResourceKind::TargetGroup, [], root.child_options())
            .unwrap_err();
        assert!(matches!(err, StackwrightError::DuplicateResource { .. }));
    }

    #[test]
    fn same_name_under_different_parents_is_allowed() {
        let mut ctx = context();
        let a = ctx.register_component("t:a:A", "a", None).expect("a");
        let b = ctx.register_component("t:b:B", "b", None).expect("b");
        let _ = ctx
            .declare("pipeline", ResourceKind::Pipeline, [], a.child_options())
            .expect("a");
        let _ = ctx
            .declare("pipeline", ResourceKind::Pipeline, [], b.child_options())
            .expect("b");
        assert_eq!(ctx.declarations_of(&ResourceKind::Pipeline).len(), 2);
    }

    #[test]
    fn same_name_under_parents_of_one_kind_is_allowed() {
        let mut ctx = context();
        let docs = ctx
            .register_component("stackwright:web:StaticWebCICD", "docs-stage-cicd", None)
            .expect("docs");
        let blog = ctx
            .register_component("stackwright:web:StaticWebCICD", "blog-stage-cicd", None)
            .expect("blog");
        let first = ctx
            .declare("pipeline", ResourceKind::Pipeline, [], docs.child_options())
            .expect("docs pipeline");
        let second = ctx
            .declare("pipeline", ResourceKind::Pipeline, [], blog.child_options())
            .expect("blog pipeline");

        assert_ne!(first.urn, second.urn);
        assert_eq!(first.urn.name(), "pipeline");
        assert!(ctx.is_descendant_or_self(&second.urn, blog.urn()));
        assert!(!ctx.is_descendant_or_self(&second.urn, docs.urn()));
        let graph = ctx.graph().expect("graph");
        assert!(graph.has_edge(&first.urn, docs.urn(), EdgeKind::Parent));
        assert!(graph.has_edge(&second.urn, blog.urn(), EdgeKind::Parent));
    }

    #[test]
    fn auto_tags_are_stamped_on_taggable_kinds_only() {
        let mut ctx = context();
        ctx.register_auto_tags(Tags::for_service("prod", "checkout"));
        let root = ctx.register_component("t:api:Api", "api", None).expect("component");
        let lb = ctx
            .declare("lb", ResourceKind::LoadBalancer, [], root.child_options())
            .expect("lb");
        let policy = ctx
            .declare("policy", ResourceKind::ScalingPolicy, [], root.child_options())
            .expect("policy");

        let tags = ctx
            .declaration(&lb.urn)
            .and_then(|d| d.property("tags"))
            .expect("tags");
        assert_eq!(tags.get("Environment").and_then(Input::as_literal_str), Some("prod"));
        assert_eq!(tags.get("Name").and_then(Input::as_literal_str), Some("checkout"));
        assert!(ctx.declaration(&policy.urn).and_then(|d| d.property("tags")).is_none());
        assert!(ctx.declaration(root.urn()).and_then(|d| d.property("tags")).is_none());
    }

    #[test]
    fn explicit_tags_win_over_auto_tags() {
        let mut ctx = context();
        ctx.register_auto_tags(Tags::for_service("prod", "checkout"));
        let bucket = ctx
            .declare(
                "bucket",
                ResourceKind::Bucket,
                [("tags", Input::object([("Name", "custom".into())]))],
                ResourceOptions::default(),
            )
            .expect("bucket");
        let tags = ctx.declaration(&bucket.urn).and_then(|d| d.property("tags")).expect("tags");
        assert_eq!(tags.get("Name").and_then(Input::as_literal_str), Some("custom"));
        assert_eq!(tags.get("Environment").and_then(Input::as_literal_str), Some("prod"));
    }

    #[test]
    fn unknown_dependency_is_rejected() {
        let mut ctx = context();
        let ghost = Urn::new("dev", "stackwright", "aws:lb:Listener", "ghost");
        let err = ctx
            .declare(
                "svc",
                ResourceKind::Service,
                [],
                ResourceOptions::default().depends_on(&ghost),
            )
            .unwrap_err();
        assert!(matches!(err, StackwrightError::UnknownResource { .. }));
    }

    #[test]
    fn engine_rejection_leaves_no_record() {
        let mut ctx = DeploymentContext::new(
            StackwrightConfig::default(),
            Box::new(Recorder {
                reject: Some("tg"),
                ..Recorder::default()
            }),
        );
        let err = ctx
            .declare("tg", ResourceKind::TargetGroup, [], ResourceOptions::default())
            .unwrap_err();
        assert!(matches!(err, StackwrightError::Declaration { .. }));
        assert!(ctx.is_empty());
    }

    #[test]
    fn component_outputs_must_come_from_descendants() {
        let mut ctx = context();
        let api = ctx.register_component("t:api:Api", "api", None).expect("api");
        let other = ctx.register_component("t:web:Web", "web", None).expect("web");
        let lb = ctx
            .declare("lb", ResourceKind::LoadBalancer, [], api.child_options())
            .expect("lb");
        let bucket = ctx
            .declare("bucket", ResourceKind::Bucket, [], other.child_options())
            .expect("bucket");

        ctx.register_outputs(&api, [("dns", lb.output("dnsName").expect("dns"))])
            .expect("own output");
        let err = ctx
            .register_outputs(&api, [("bucket", bucket.output("bucket").expect("bucket"))])
            .unwrap_err();
        assert!(matches!(err, StackwrightError::ForeignOutput { .. }));
        assert_eq!(ctx.component_outputs()[api.urn()].len(), 1);
    }

    #[test]
    fn graph_combines_all_edge_kinds() {
        let mut ctx = context();
        let api = ctx.register_component("t:api:Api", "api", None).expect("api");
        let tg = ctx
            .declare("tg", ResourceKind::TargetGroup, [], api.child_options())
            .expect("tg");
        let listener = ctx
            .declare(
                "https-listener",
                ResourceKind::Listener,
                [("targetGroupArn", tg.output("arn").expect("arn"))],
                api.child_options(),
            )
            .expect("listener");
        let svc = ctx
            .declare(
                "svc",
                ResourceKind::Service,
                [("targetGroupArn", tg.output("arn").expect("arn"))],
                api.child_options().depends_on(&listener.urn),
            )
            .expect("svc");

        let graph = ctx.graph().expect("graph");
        assert!(graph.has_edge(&svc.urn, api.urn(), EdgeKind::Parent));
        assert!(graph.has_edge(&svc.urn, &listener.urn, EdgeKind::Explicit));
        assert!(graph.has_edge(&svc.urn, &tg.urn, EdgeKind::Reference));
        assert!(graph.has_edge(&listener.urn, &tg.urn, EdgeKind::Reference));

        let order = graph.resolve_order().expect("order");
        let pos = |u: &Urn| order.iter().position(|o| o == u).expect("present");
        assert!(pos(api.urn()) < pos(&tg.urn));
        assert!(pos(&listener.urn) < pos(&svc.urn));
    }

    #[test]
    fn export_names_are_unique() {
        let mut ctx = context();
        let lb = ctx
            .declare("lb", ResourceKind::LoadBalancer, [], ResourceOptions::default())
            .expect("lb");
        ctx.export("dns", lb.output("dnsName").expect("dns")).expect("first");
        let err = ctx.export("dns", Input::from("other")).unwrap_err();
        assert!(matches!(err, StackwrightError::DuplicateExport { ref name } if name == "dns"));
        assert_eq!(
            ctx.exports()["dns"].as_output().map(|o| o.property.as_str()),
            Some("dnsName")
        );
    }

    #[test]
    fn unknown_output_property_is_an_error() {
        let mut ctx = context();
        let lb = ctx
            .declare("lb", ResourceKind::LoadBalancer, [], ResourceOptions::default())
            .expect("lb");
        assert!(matches!(
            lb.output("bucket"),
            Err(StackwrightError::UnknownOutput { .. })
        ));
    }
}
