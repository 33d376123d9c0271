//! Script engine for evaluating Rhai drawing scripts

use crate::canvas_api::{begin_canvas, finish_canvas, register_canvas_api};
use crate::error::ScriptError;
use easel_core::drawing::Drawing;
use easel_core::status::OutputChunk;
use parking_lot::Mutex;
use rhai::{AST, CallFnOptions, Dynamic, Engine, INT, Scope};
use std::sync::Arc;

/// Easel script engine
///
/// `print` and `debug` output is buffered rather than written to the
/// console; callers drain it with [`ScriptEngine::take_output`] after each
/// evaluation so it can be routed to the right stream.
pub struct ScriptEngine {
    engine: Engine,
    output: Arc<Mutex<Vec<OutputChunk>>>,
}

impl ScriptEngine {
    /// Create a new script engine with the canvas API registered
    pub fn new() -> Self {
        let mut engine = Engine::new();
        register_canvas_api(&mut engine);

        // Configure engine for better errors
        engine.set_max_expr_depths(64, 64);

        let output = Arc::new(Mutex::new(Vec::new()));

        let sink = output.clone();
        engine.on_print(move |text| {
            sink.lock().push(OutputChunk::stdout(format!("{text}\n")));
        });

        let sink = output.clone();
        engine.on_debug(move |text, _source, pos| {
            let line = if pos.is_none() {
                format!("{text}\n")
            } else {
                format!("{pos}: {text}\n")
            };
            sink.lock().push(OutputChunk::stderr(line));
        });

        Self { engine, output }
    }

    /// Compile a script to check for syntax errors without running it
    pub fn compile(&self, source: &str) -> Result<AST, ScriptError> {
        self.engine
            .compile(source)
            .map_err(|e| {
                tracing::debug!(error = %e, "script failed to compile");
                ScriptError::Compile(e.to_string())
            })
    }

    /// Compile and run a script, producing its first frame
    ///
    /// `metadata` is exposed to the script as the constant `OPTS`.
    pub fn load(&self, source: &str, metadata: &serde_json::Value) -> Result<Program, ScriptError> {
        let ast = self.compile(source)?;
        let metadata = rhai::serde::to_dynamic(metadata)
            .map_err(|e| ScriptError::Metadata(e.to_string()))?;

        let has_draw = ast
            .iter_functions()
            .any(|f| f.name == "draw" && f.params.len() == 1);
        let has_setup = ast
            .iter_functions()
            .any(|f| f.name == "setup" && f.params.is_empty());
        tracing::trace!(has_draw, has_setup, "script compiled");

        let mut program = Program {
            ast,
            scope: Scope::new(),
            metadata,
            has_draw,
            has_setup,
            top_level_done: false,
            setup_done: false,
            size: None,
            speed: None,
            drawing: Drawing::default(),
        };
        program.render(self, 1)?;
        Ok(program)
    }

    /// Drain the output buffered since the last call
    pub fn take_output(&self) -> Vec<OutputChunk> {
        std::mem::take(&mut *self.output.lock())
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// A loaded script, able to render any frame
///
/// Scripts without a `draw(frame)` function are re-run from the top for
/// every frame with `FRAME` set. Scripts with one run their top level
/// once, `setup()` once, then `draw(frame)` per frame.
pub struct Program {
    ast: AST,
    scope: Scope<'static>,
    metadata: Dynamic,
    has_draw: bool,
    has_setup: bool,
    top_level_done: bool,
    setup_done: bool,
    size: Option<(u32, u32)>,
    speed: Option<f64>,
    drawing: Drawing,
}

impl Program {
    /// Render frame `frame` (1-based) and return the resulting drawing
    pub fn render(&mut self, engine: &ScriptEngine, frame: u32) -> Result<&Drawing, ScriptError> {
        if !self.has_draw || !self.top_level_done {
            self.run_top_level(engine, frame)?;
            if !self.has_draw {
                return Ok(&self.drawing);
            }
        }

        begin_canvas(self.size, self.speed);

        if self.has_setup && !self.setup_done {
            self.setup_done = true;
            self.call(engine, "setup", ())?;
        }
        self.call(engine, "draw", (INT::from(frame),))?;

        let state = finish_canvas();
        // draw() may resize the canvas; later frames keep the new size
        self.size = state.size;
        self.drawing = state.drawing;
        Ok(&self.drawing)
    }

    fn run_top_level(&mut self, engine: &ScriptEngine, frame: u32) -> Result<(), ScriptError> {
        let mut scope = Scope::new();
        scope.push_constant_dynamic("OPTS", self.metadata.clone());
        scope.push_constant("FRAME", INT::from(frame));

        begin_canvas(None, None);
        let result = engine.engine.run_ast_with_scope(&mut scope, &self.ast);
        let state = finish_canvas();
        result.map_err(|e| {
            tracing::debug!(frame, error = %e, "script failed at top level");
            ScriptError::Runtime(e.to_string())
        })?;

        self.scope = scope;
        self.size = state.size;
        self.speed = state.speed;
        self.drawing = state.drawing;
        self.top_level_done = true;
        Ok(())
    }

    fn call(
        &mut self,
        engine: &ScriptEngine,
        name: &str,
        args: impl rhai::FuncArgs,
    ) -> Result<(), ScriptError> {
        let options = CallFnOptions::new().eval_ast(false).rewind_scope(true);
        engine
            .engine
            .call_fn_with_options::<Dynamic>(options, &mut self.scope, &self.ast, name, args)
            .map(|_| ())
            .map_err(|e| {
                tracing::debug!(function = name, error = %e, "script function failed");
                ScriptError::Runtime(format!("in {name}(): {e}"))
            })
    }

    /// Whether the script should play as an animation
    pub fn is_animated(&self) -> bool {
        self.has_draw && self.speed.is_some()
    }

    pub fn has_draw(&self) -> bool {
        self.has_draw
    }

    /// Frame rate declared with `speed()`
    pub fn speed(&self) -> Option<f64> {
        self.speed
    }

    /// Whether the script called `size()`
    pub fn size_declared(&self) -> bool {
        self.size.is_some()
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        self.drawing.size()
    }

    /// The most recently rendered frame
    pub fn drawing(&self) -> &Drawing {
        &self.drawing
    }
}
