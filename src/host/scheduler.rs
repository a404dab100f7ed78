//! Fixed-point pass scheduling.
//!
//! Semantic passes drain a worklist of classes: each class is analyzed and,
//! if routed, handed to the collection hook. Classes that are not ready, or
//! whose hook defers, go back on the list for the next pass. A pass without
//! progress makes the next one final, where nothing is pending any more. A
//! single type-checking pass then runs the verification hook.
use std::collections::VecDeque;

use regex::Regex;

use crate::diagnostics::{Code, Diagnostic};
use crate::host::program::Program;
use crate::host::{CheckContext, HookOutcome, Plugin, SemanticContext, routes_to};

#[derive(Debug, Clone)]
pub struct Scheduler {
    pub max_iterations: usize,
    /// Only verify classes whose fullname matches.
    pub select: Option<Regex>,
}

/// What the semantic passes did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub passes: usize,
    /// Classes still queued when the pass bound was hit.
    pub unconverged: Vec<String>,
}

enum Visit {
    Done,
    /// Queue again; `progress` is whether anything changed on the way.
    Again { progress: bool },
}

impl Scheduler {
    pub fn new(max_iterations: usize) -> Self {
        Self { max_iterations, select: None }
    }

    pub fn with_select(mut self, select: Option<Regex>) -> Self {
        self.select = select;
        self
    }

    /// Semantic passes followed by the checking pass.
    pub fn run(&self, program: &mut Program, plugin: &mut dyn Plugin) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        self.semantic_passes(program, plugin, &mut diagnostics);
        self.check_pass(program, plugin, &mut diagnostics);
        diagnostics
    }

    pub fn semantic_passes(
        &self,
        program: &mut Program,
        plugin: &mut dyn Plugin,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> PassReport {
        let mut queue: VecDeque<String> = program.declared().iter().cloned().collect();
        let mut passes = 0;
        let mut final_pass = false;

        while !queue.is_empty() {
            if passes == self.max_iterations {
                log::warn!("giving up on {} classes after {passes} passes", queue.len());
                for fullname in &queue {
                    let Some(symbol) = program.symbol(fullname) else { continue };
                    diagnostics.push(Diagnostic::error(
                        symbol.location(symbol.defn.span),
                        Code::NonConvergence,
                        format!("Cannot finish analyzing \"{fullname}\" within {passes} passes"),
                    ));
                }
                program.set_final_iteration(false);
                return PassReport { passes, unconverged: queue.into_iter().collect() };
            }

            passes += 1;
            program.set_final_iteration(final_pass);
            log::debug!(
                "semantic pass {passes}{}: {} classes queued",
                if final_pass { " (final)" } else { "" },
                queue.len()
            );

            let mut progress = false;
            let mut next = VecDeque::new();
            for fullname in queue.drain(..) {
                match visit(program, plugin, &fullname, final_pass, diagnostics) {
                    Visit::Done => progress = true,
                    Visit::Again { progress: moved } => {
                        progress |= moved;
                        next.push_back(fullname);
                    }
                }
            }
            queue = next;
            if !progress {
                final_pass = true;
            }
        }

        program.set_final_iteration(false);
        PassReport { passes, unconverged: Vec::new() }
    }

    /// Runs the verification hook once per routed class, in declaration
    /// order. Returns how many classes were verified.
    pub fn check_pass(&self, program: &Program, plugin: &dyn Plugin, diagnostics: &mut Vec<Diagnostic>) -> usize {
        let mut verified = 0;
        for fullname in program.declared() {
            let Some(symbol) = program.symbol(fullname) else { continue };
            if !routes_to(plugin, symbol) {
                continue;
            }
            if self.select.as_ref().is_some_and(|select| !select.is_match(fullname)) {
                continue;
            }
            let before = diagnostics.len();
            let mut ctx = CheckContext::new(program, diagnostics);
            plugin.verify_class(&mut ctx, symbol);
            log::debug!("{fullname}: {} diagnostics", diagnostics.len() - before);
            verified += 1;
        }
        verified
    }
}

fn visit(
    program: &mut Program,
    plugin: &mut dyn Plugin,
    fullname: &str,
    force: bool,
    diagnostics: &mut Vec<Diagnostic>,
) -> Visit {
    let became_ready = if program.is_ready(fullname) {
        false
    } else if program.analyze_class(fullname, force) {
        true
    } else {
        log::debug!("{fullname}: waiting for base classes");
        return Visit::Again { progress: false };
    };

    let program: &Program = program;
    let Some(symbol) = program.symbol(fullname) else { return Visit::Done };
    if !routes_to(plugin, symbol) {
        return Visit::Done;
    }
    let mut ctx = SemanticContext::new(program, &symbol.path, diagnostics);
    match plugin.collect_class(&mut ctx, symbol) {
        HookOutcome::Done => Visit::Done,
        HookOutcome::Deferred => {
            log::debug!("{fullname}: deferred");
            Visit::Again { progress: became_ready }
        }
    }
}
