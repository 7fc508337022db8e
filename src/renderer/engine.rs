//! Render orchestration
//!
//! Each call runs: load, merge data, cache check, directive evaluation,
//! import resolution, enhancement, style injection (root only),
//! serialization, cache store.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, info_span, warn, Instrument};

use crate::cache::RenderCache;
use crate::config::RenderConfig;
use crate::directives::DirectiveEvaluator;
use crate::enhance::{self, CommentStrippingCompiler, CssGenerator, ScriptCompiler, UtilityCssGenerator};
use crate::fingerprint::{self, RenderMode};
use crate::head::{self, AssetKey, HeadAsset, HeadAssets};
use crate::imports::ImportResolver;
use crate::manifest::ComponentDefinition;
use crate::markup::{self, Document};
use crate::source::ComponentSource;
use crate::value::DataMap;
use crate::RenderError;

use super::context::merge_data;

/// Output of one component render
///
/// For a root render `markup` is the whole document and `head` is empty.
/// For a descendant render `markup` is the component's body content and
/// `head` holds the assets its caller must lift into the root's head.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub markup: String,
    pub head: HeadAssets,
    /// Every import chain rendered below this component, in render order.
    /// Each chain starts at a direct child and ends at the component it
    /// reaches.
    pub import_paths: Vec<Vec<String>>,
}

/// Per-call state threaded through a root render and all its descendants
#[derive(Debug, Default)]
pub struct RenderSession {
    ancestry: Vec<String>,
}

impl RenderSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// URIs currently being rendered, outermost first
    pub fn ancestry(&self) -> &[String] {
        &self.ancestry
    }

    pub fn depth(&self) -> usize {
        self.ancestry.len()
    }
}

/// Renders components from a source into HTML
pub struct Renderer {
    source: Arc<dyn ComponentSource>,
    config: RenderConfig,
    cache: Arc<RenderCache>,
    compiler: Arc<dyn ScriptCompiler>,
    css: Arc<dyn CssGenerator>,
    component_ids: DashMap<String, String>,
    compiled: DashMap<String, String>,
}

impl Renderer {
    /// Create a renderer with default configuration, a fresh render cache
    /// and the default plugins
    pub fn new(source: Arc<dyn ComponentSource>) -> Self {
        Self {
            source,
            config: RenderConfig::default(),
            cache: Arc::new(RenderCache::new()),
            compiler: Arc::new(CommentStrippingCompiler::new()),
            css: Arc::new(UtilityCssGenerator::new()),
            component_ids: DashMap::new(),
            compiled: DashMap::new(),
        }
    }

    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    /// Share a render cache with other renderers
    pub fn with_cache(mut self, cache: Arc<RenderCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_compiler(mut self, compiler: Arc<dyn ScriptCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn with_css_generator(mut self, css: Arc<dyn CssGenerator>) -> Self {
        self.css = css;
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<RenderCache> {
        &self.cache
    }

    /// Render a component as the root of a new document
    pub async fn render(&self, uri: &str, data: Option<DataMap>) -> Result<String, RenderError> {
        let mut session = RenderSession::new();
        let rendered = self
            .render_component(uri, data, &mut session, RenderMode::Root)
            .await?;
        Ok(rendered.markup.clone())
    }

    /// Render one component within a session
    ///
    /// Fails with [`RenderError::CyclicImport`] when `uri` is already being
    /// rendered further up the session, and with
    /// [`RenderError::DepthExceeded`] past the configured depth.
    pub fn render_component<'a>(
        &'a self,
        uri: &'a str,
        data: Option<DataMap>,
        session: &'a mut RenderSession,
        mode: RenderMode,
    ) -> BoxFuture<'a, Result<Arc<Rendered>, RenderError>> {
        let span = info_span!("render", uri, depth = session.depth());
        async move {
            if session.ancestry.iter().any(|ancestor| ancestor == uri) {
                let mut chain = session.ancestry.clone();
                chain.push(uri.to_string());
                return Err(RenderError::CyclicImport { chain });
            }
            if session.depth() > self.config.max_depth {
                return Err(RenderError::DepthExceeded {
                    uri: uri.to_string(),
                    limit: self.config.max_depth,
                });
            }

            session.ancestry.push(uri.to_string());
            let result = self.render_uncached(uri, data, session, mode).await;
            session.ancestry.pop();
            result
        }
        .instrument(span)
        .boxed()
    }

    async fn render_uncached(
        &self,
        uri: &str,
        data: Option<DataMap>,
        session: &mut RenderSession,
        mode: RenderMode,
    ) -> Result<Arc<Rendered>, RenderError> {
        let definition = self.source.load(uri, &self.config.load_options).await?;
        let data = merge_data(&definition.settings, data);
        let fingerprint = fingerprint::fingerprint(
            &data,
            &definition.template,
            definition.script.as_deref(),
            mode,
        );

        if self.config.render_cache_enabled {
            if let Some(hit) = self.cache.get(uri, &fingerprint) {
                debug!(uri, %fingerprint, "render cache hit");
                self.check_cached_paths(&hit, session)?;
                return Ok(hit);
            }
        }
        debug!(uri, %fingerprint, "render cache miss");

        let mut doc = parse_template(uri, &definition.template)?;
        let imports = &definition.settings.imports;
        DirectiveEvaluator::new(imports).evaluate(&mut doc, &data);

        let mut resolver = ImportResolver::new(self, imports, uri);
        let root = doc.root();
        resolver.resolve_children(&mut doc, root, session).await?;
        let (mut assets, import_paths) = resolver.into_parts();

        let enhancement = self.enhancement(uri, &definition, &data).await;

        let rendered = match mode {
            RenderMode::Root => {
                for asset in enhancement {
                    assets.push(asset);
                }
                if let Some(style) = self.generate_styles(uri, &definition, &doc).await {
                    assets.push(style);
                }
                head::merge_into_document(&mut doc, &assets).map_err(|source| {
                    RenderError::Markup {
                        component: uri.to_string(),
                        source,
                    }
                })?;
                Rendered {
                    markup: markup::serialize(&doc, doc.root()),
                    head: HeadAssets::new(),
                    import_paths,
                }
            }
            RenderMode::Descendant => {
                let (own, body) = head::split_fragment(&doc);
                assets.extend(&own);
                for asset in enhancement {
                    assets.push(asset);
                }
                Rendered {
                    markup: markup::serialize_nodes(&doc, &body),
                    head: assets,
                    import_paths,
                }
            }
        };

        if self.config.render_cache_enabled {
            Ok(self.cache.insert(uri, fingerprint, rendered))
        } else {
            Ok(Arc::new(rendered))
        }
    }

    /// Replay the cycle and depth checks a cached render skipped. The first
    /// failing chain in render order gives the same error a cold render
    /// reports.
    fn check_cached_paths(
        &self,
        rendered: &Rendered,
        session: &RenderSession,
    ) -> Result<(), RenderError> {
        let limit = self.config.max_depth;
        for path in &rendered.import_paths {
            let Some(target) = path.last() else {
                continue;
            };
            if session.ancestry.contains(target) {
                let mut chain = session.ancestry.clone();
                chain.extend(path.iter().cloned());
                return Err(RenderError::CyclicImport { chain });
            }
            // Number of ancestors `target` renders under
            if session.depth() + path.len() - 1 > limit {
                return Err(RenderError::DepthExceeded {
                    uri: target.clone(),
                    limit,
                });
            }
        }
        Ok(())
    }

    /// Stable identifier for a component, generated once per URI
    fn component_id(&self, uri: &str) -> String {
        self.component_ids
            .entry(uri.to_string())
            .or_insert_with(|| fingerprint::component_id(uri))
            .clone()
    }

    /// Registration and bootstrap scripts for a component's enhancement.
    /// Compilation failures are logged and leave the component without
    /// enhancement.
    async fn enhancement(
        &self,
        uri: &str,
        definition: &ComponentDefinition,
        data: &DataMap,
    ) -> Vec<HeadAsset> {
        let Some(source) = definition.script.as_deref() else {
            return Vec::new();
        };

        let key = fingerprint::digest(source);
        let cached = self.compiled.get(&key).map(|entry| entry.value().clone());
        let compiled = match cached {
            Some(compiled) => compiled,
            None => match self.compiler.compile(source).await {
                Ok(compiled) => {
                    self.compiled
                        .entry(key)
                        .or_insert_with(|| compiled.clone());
                    compiled
                }
                Err(e) => {
                    warn!(uri, error = %e, "skipping enhancement script");
                    return Vec::new();
                }
            },
        };
        if compiled.trim().is_empty() {
            return Vec::new();
        }

        let global = &self.config.enhancement_global;
        let id = self.component_id(uri);
        vec![
            enhance::registration_script(global, &id, &compiled),
            enhance::bootstrap_script(global, &id, data),
        ]
    }

    /// Stylesheet for the root document when the component enables the CSS
    /// plugin. Generation failures are logged and skipped.
    async fn generate_styles(
        &self,
        uri: &str,
        definition: &ComponentDefinition,
        doc: &Document,
    ) -> Option<HeadAsset> {
        let config = definition.settings.plugin(&self.config.css_plugin)?;
        let markup_text = markup::serialize(doc, doc.root());
        match self.css.generate(&markup_text, config).await {
            Ok(css) if css.trim().is_empty() => None,
            Ok(css) => {
                let key = AssetKey::Style(css.clone());
                Some(HeadAsset::new(key, format!("<style>{}</style>", css)))
            }
            Err(e) => {
                warn!(uri, error = %e, "skipping generated styles");
                None
            }
        }
    }
}

fn parse_template(uri: &str, template: &str) -> Result<Document, RenderError> {
    markup::parse(template).map_err(|source| RenderError::Markup {
        component: uri.to_string(),
        source,
    })
}
