//! Request orchestration: the cache, generator, publish state machine.
//!
//! Each request is a single sequence of blocking steps; input resolution
//! recurses depth-first, one input at a time. Concurrent callers
//! coordinate only through filesystem state (see [`crate::cache`]).

use std::collections::{BTreeMap, BTreeSet};
use std::fs;

use gristmill_config::EngineConfig;
use tracing::{debug, info, warn};

use crate::cache::{self, CacheState, PlaceholderLock};
use crate::descriptor::ProductDescriptor;
use crate::directives::{self, Directive};
use crate::error::{EngineError, EngineResult};
use crate::exec;
use crate::inputs;
use crate::paths::ProductPaths;
use crate::request::{Action, GenerationReport};
use crate::status::Status;

/// Environment variable naming the generator's output directory.
const ENV_OUTDIR: &str = "OUTDIR";
/// Environment variable naming the generator's output filename.
const ENV_OUTFILE: &str = "OUTFILE";
/// Environment variable carrying the comma-joined resolved input names.
const ENV_INPUTKEYS: &str = "INPUTKEYS";

/// Phases of the request state machine, labelling progress events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    CheckCache,
    CheckGenerator,
    ResolveInputs,
    Execute,
    Publish,
    ApplyDirectives,
}

impl Phase {
    const fn as_str(self) -> &'static str {
        match self {
            Self::CheckCache => "check_cache",
            Self::CheckGenerator => "check_generator",
            Self::ResolveInputs => "resolve_inputs",
            Self::Execute => "execute",
            Self::Publish => "publish",
            Self::ApplyDirectives => "apply_directives",
        }
    }
}

/// Product generation service: resolves requests against the cache and
/// drives external generator scripts for misses.
#[derive(Debug, Clone)]
pub struct ProductService {
    config: EngineConfig,
}

impl ProductService {
    /// Construct a service over the given configuration.
    #[must_use]
    pub const fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Access the active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve or generate the product named by a raw descriptor string.
    ///
    /// # Errors
    ///
    /// Returns an error when the descriptor cannot be parsed or an
    /// unexpected filesystem fault occurs; domain outcomes are statuses
    /// on the report.
    pub fn make(&self, spec: &str) -> EngineResult<GenerationReport> {
        let descriptor: ProductDescriptor = spec.parse()?;
        self.make_request(&descriptor, &BTreeSet::from([Action::Make]), &BTreeSet::new())
    }

    /// Handle one request with explicit actions and directives.
    ///
    /// # Errors
    ///
    /// Returns an error for unresolvable descriptors and unexpected
    /// filesystem faults; all generation outcomes, including failures,
    /// are reported through the returned [`GenerationReport`].
    pub fn make_request(
        &self,
        descriptor: &ProductDescriptor,
        actions: &BTreeSet<Action>,
        directives: &BTreeSet<Directive>,
    ) -> EngineResult<GenerationReport> {
        let mut chain = Vec::new();
        self.handle(descriptor, actions, directives, &mut chain)
    }

    /// Cycle-guarded entry used for both top-level and recursive requests.
    /// `chain` holds the canonical filenames of every ancestor request.
    fn handle(
        &self,
        descriptor: &ProductDescriptor,
        actions: &BTreeSet<Action>,
        directives: &BTreeSet<Directive>,
        chain: &mut Vec<String>,
    ) -> EngineResult<GenerationReport> {
        let product = descriptor.filename();
        if chain.iter().any(|ancestor| ancestor == &product) {
            return Err(EngineError::DependencyCycle { product });
        }
        chain.push(product);
        let result = self.run_request(descriptor, actions, directives, chain);
        chain.pop();
        result
    }

    #[allow(clippy::too_many_lines)]
    fn run_request(
        &self,
        descriptor: &ProductDescriptor,
        actions: &BTreeSet<Action>,
        directives: &BTreeSet<Directive>,
        chain: &mut Vec<String>,
    ) -> EngineResult<GenerationReport> {
        let paths = ProductPaths::resolve(
            descriptor,
            &self.config.product_root,
            &self.config.cache_root,
        )?;
        let mut report = GenerationReport::begun(descriptor.filename());
        info!(
            request = %report.request_id,
            product = %report.product,
            actions = ?actions,
            "handling product request"
        );

        debug!(
            phase = Phase::CheckCache.as_str(),
            path = %paths.final_path.display(),
            "classifying cache state"
        );
        let state = cache::classify(&paths.final_path)?;

        if actions.contains(&Action::Delete) {
            if state == CacheState::Miss {
                if !actions.contains(&Action::Make) {
                    warn!(path = %paths.final_path.display(), "nothing to delete");
                    report.status = Status::NOT_FOUND;
                    return Ok(finish(report));
                }
            } else {
                cache::delete_artifact(&paths.final_path)?;
                info!(path = %paths.final_path.display(), "artifact deleted");
                report.status = Status::ACCEPTED;
                return Ok(finish(report));
            }
        }

        if actions.contains(&Action::Make) {
            match state {
                CacheState::Hit => {
                    info!(path = %paths.final_path.display(), "non-empty artifact found");
                    report.status = Status::OK;
                    report.artifact = Some(paths.final_path.clone());
                    return Ok(finish(report));
                }
                CacheState::Busy => {
                    warn!(path = %paths.final_path.display(), "generation already in progress");
                    report.status = Status::ACCEPTED;
                    return Ok(finish(report));
                }
                CacheState::Miss => {}
            }
        }

        let generator = paths.generator_dir.join(&self.config.generator_script);
        if !generator.exists() {
            warn!(
                phase = Phase::CheckGenerator.as_str(),
                path = %generator.display(),
                "generator not available"
            );
            report.status = Status::NOT_IMPLEMENTED;
            return Ok(finish(report));
        }
        debug!(
            phase = Phase::CheckGenerator.as_str(),
            path = %generator.display(),
            "generator available"
        );

        let make = actions.contains(&Action::Make);
        let mut env = descriptor.base_env();
        let mut lock: Option<PlaceholderLock> = None;
        if make {
            if let Some(parent) = paths.final_path.parent() {
                cache::ensure_dir(parent)?;
            }
            if let Some(parent) = paths.temp_path.parent() {
                cache::ensure_dir(parent)?;
                env.insert(ENV_OUTDIR.to_string(), parent.to_string_lossy().into_owned());
            }
            env.insert(ENV_OUTFILE.to_string(), report.product.clone());

            match PlaceholderLock::acquire(&paths.final_path)? {
                Some(guard) => lock = Some(guard),
                None => {
                    warn!(
                        path = %paths.final_path.display(),
                        "lost placeholder race; reporting busy"
                    );
                    report.status = Status::ACCEPTED;
                    return Ok(finish(report));
                }
            }
        }

        if make || actions.contains(&Action::ListInputs) {
            debug!(
                phase = Phase::ResolveInputs.as_str(),
                product = %report.product,
                "resolving input listing"
            );
            let lister = paths.generator_dir.join(&self.config.input_script);
            let listing = inputs::resolve_listing(&lister, &descriptor.base_env())?;
            if !listing.succeeded() {
                report.status = Status::CONFLICT;
                report.exit_code = Some(listing.exit_code);
                report.diagnostic = listing.diagnostic;
                // The placeholder guard, if held, is released on return.
                return Ok(finish(report));
            }
            report.inputs = listing.inputs.clone();

            if make {
                let resolved = self.resolve_inputs(&listing.inputs, chain);
                env.insert(
                    ENV_INPUTKEYS.to_string(),
                    resolved.keys().cloned().collect::<Vec<_>>().join(","),
                );
                env.extend(resolved.iter().map(|(name, path)| (name.clone(), path.clone())));
                report.inputs = resolved;
            }
        }

        if make {
            info!(
                phase = Phase::Execute.as_str(),
                product = %report.product,
                "running generator"
            );
            let output = exec::run(&generator, &paths.generator_dir, &env)?;
            report.exit_code = Some(output.exit_code);
            report.stdout = non_empty(&output.stdout);
            report.stderr = non_empty(&output.stderr);

            if !output.succeeded() {
                report.status = output.reported_status().unwrap_or(Status::CONFLICT);
                report.diagnostic = output.last_line().map(str::to_string);
                warn!(
                    product = %report.product,
                    exit_code = output.exit_code,
                    status = %report.status,
                    "generator failed"
                );
                exec::persist_failure_logs(&paths.final_path, &output);
                return Ok(finish(report));
            }

            let temp_len = fs::metadata(&paths.temp_path)
                .map(|meta| meta.len())
                .unwrap_or(0);
            if temp_len == 0 {
                warn!(
                    product = %report.product,
                    "generator exited cleanly but produced no content"
                );
                report.status = Status::NO_CONTENT;
                return Ok(finish(report));
            }

            debug!(
                phase = Phase::Publish.as_str(),
                path = %paths.final_path.display(),
                "publishing artifact"
            );
            if let Some(guard) = lock.take() {
                guard.publish(&paths.temp_path)?;
            }
            report.status = Status::OK;
            report.artifact = Some(paths.final_path.clone());

            if !directives.is_empty() {
                debug!(
                    phase = Phase::ApplyDirectives.as_str(),
                    count = directives.len(),
                    "applying directives"
                );
                directives::apply(directives, &paths, &output.combined());
            }
        }

        Ok(finish(report))
    }

    /// Resolve each listed input by recursively driving a MAKE request.
    /// Best-effort and sequential: a failing input is skipped and logged,
    /// never fatal to the parent.
    fn resolve_inputs(
        &self,
        listing: &BTreeMap<String, String>,
        chain: &mut Vec<String>,
    ) -> BTreeMap<String, String> {
        let mut resolved = BTreeMap::new();
        let make_only = BTreeSet::from([Action::Make]);
        for (name, spec) in listing {
            let descriptor: ProductDescriptor = match spec.parse() {
                Ok(descriptor) => descriptor,
                Err(err) => {
                    warn!(input = %name, error = %err, "skipping input with unparsable descriptor");
                    continue;
                }
            };
            match self.handle(&descriptor, &make_only, &BTreeSet::new(), chain) {
                Ok(child) => match child.artifact {
                    Some(path) => {
                        debug!(input = %name, path = %path.display(), "input resolved");
                        resolved.insert(name.clone(), path.to_string_lossy().into_owned());
                    }
                    None => {
                        warn!(input = %name, status = %child.status, "input skipped");
                    }
                },
                Err(err) => {
                    warn!(input = %name, error = %err, "input skipped");
                }
            }
        }
        resolved
    }
}

fn finish(mut report: GenerationReport) -> GenerationReport {
    report.finished_at = chrono::Utc::now();
    info!(
        request = %report.request_id,
        product = %report.product,
        status = %report.status,
        "request finished"
    );
    report
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
