//! Native code generation for dense DFAs, using Cranelift.
//!
//! Every DFA state becomes two blocks:
//! - a head block, entered right after a byte is consumed, which records matches and
//!   leaves on the dead state or on a return to a start state
//! - a body block, which reads the next byte and branches on byte ranges straight to the next state's head
//!
//! The generated function implements exactly [`Engine::run`], and is checked against the
//! transition table before it is used.

use cranelift_codegen::{
    ir::{condcodes::IntCC, types, AbiParam, Block, Function, InstBuilder, MemFlags, UserFuncName},
    settings::{self, Configurable},
    Context,
};
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext, Switch, Variable};
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{default_libcall_names, Linkage, Module};

use crate::{
    config::Config,
    engines::{
        dense_dfa::{DenseDFA, DEAD},
        search::{self, Engine, RunOutcome, RunStatus},
        Automaton, CacheFull, StateID,
    },
    error::{CodegenUnavailable, Error},
    look::Context as LookContext,
};

const EARLIEST: u32 = 1;
const RESTART: u32 = 2;
const NO_MATCH: u64 = u64::MAX;

/// Written by the generated code when it returns.
#[repr(C)]
#[derive(Debug, Default)]
struct JitOutcome {
    last_match: u64,
    pos: u64,
    state: u32,
}

/// `fn(haystack, pos, end, state, flags, out) -> status`
type JitFn = unsafe extern "C" fn(*const u8, u64, u64, u32, u32, *mut JitOutcome) -> u32;

/// A dense DFA together with native code for its inner loop.
pub struct JitDfa {
    dfa: DenseDFA,
    /// Owns the code memory. Only `None` while being dropped.
    module: Option<JITModule>,
    run_fn: JitFn,
}
// SAFETY: the generated code is immutable once finalized and reads nothing but its arguments.
// The module itself is only touched again when it is freed on drop.
unsafe impl Send for JitDfa {}
unsafe impl Sync for JitDfa {}

impl JitDfa {
    /// Generates code for `dfa`.
    ///
    /// ## Errors
    /// [`CodegenUnavailable`] when code generation is turned off, the DFA has more than
    /// [`Config::jit_max_states`] states, or Cranelift does not support the host.
    pub fn emit(dfa: &DenseDFA, config: &Config) -> Result<JitDfa, CodegenUnavailable> {
        if !config.jit() {
            return Err(CodegenUnavailable::new("disabled by configuration"));
        }
        if dfa.state_count() > config.jit_max_states() {
            return Err(CodegenUnavailable::new(format!(
                "{} states exceeds the limit of {}",
                dfa.state_count(),
                config.jit_max_states()
            )));
        }

        let mut module = new_module()?;
        let pointer_type = module.target_config().pointer_type();
        if pointer_type != types::I64 {
            return Err(CodegenUnavailable::new("only 64-bit targets are supported"));
        }

        let mut sig = module.make_signature();
        sig.params.push(AbiParam::new(pointer_type)); // haystack
        sig.params.push(AbiParam::new(types::I64)); // pos
        sig.params.push(AbiParam::new(types::I64)); // end
        sig.params.push(AbiParam::new(types::I32)); // state
        sig.params.push(AbiParam::new(types::I32)); // flags
        sig.params.push(AbiParam::new(pointer_type)); // out
        sig.returns.push(AbiParam::new(types::I32)); // status

        let func_id = module
            .declare_function("dfa_run", Linkage::Local, &sig)
            .map_err(unavailable)?;
        let mut func =
            Function::with_name_signature(UserFuncName::user(0, func_id.as_u32()), sig);
        let mut builder_context = FunctionBuilderContext::new();
        let builder = FunctionBuilder::new(&mut func, &mut builder_context);
        Codegen::new(builder, dfa).emit();

        let mut ctx = Context::for_function(func);
        module
            .define_function(func_id, &mut ctx)
            .map_err(unavailable)?;
        module.clear_context(&mut ctx);
        module.finalize_definitions().map_err(unavailable)?;

        let code = module.get_finalized_function(func_id);
        // SAFETY: the function was declared with exactly this signature
        let run_fn: JitFn = unsafe { std::mem::transmute(code) };
        log::debug!("generated native code for {} DFA states", dfa.state_count());
        return Ok(JitDfa {
            dfa: dfa.clone(),
            module: Some(module),
            run_fn,
        });
    }

    /// Runs the generated code for every state on every byte class, with every combination of flags,
    /// and compares the outcome with the transition table.
    ///
    /// ## Errors
    /// [`Error::InternalInvariantViolation`] on the first disagreement.
    pub fn verify(&self) -> Result<(), Error> {
        for state in 0..self.dfa.state_count() as StateID {
            for class in 0..self.dfa.classes().alphabet_len() {
                let byte = *self.dfa.classes().range(class as u8).start();
                let haystack = [byte];
                for flags in 0..4 {
                    let earliest = flags & EARLIEST != 0;
                    let restart = flags & RESTART != 0;
                    let expected =
                        search::run(&self.dfa, &haystack, 0, 1, state, earliest, restart);
                    let actual = self.run(&haystack, 0, 1, state, earliest, restart);
                    if expected != actual {
                        return Err(Error::InternalInvariantViolation(format!(
                            "generated code for state {state} on byte {byte:#04x} returned {actual:?}, expected {expected:?}"
                        )));
                    }
                }
            }
        }
        return Ok(());
    }

    pub const fn dfa(&self) -> &DenseDFA {
        return &self.dfa;
    }
}
impl Drop for JitDfa {
    fn drop(&mut self) {
        if let Some(module) = self.module.take() {
            // SAFETY: `run_fn` points into this module and cannot be called after drop
            unsafe { module.free_memory() };
        }
    }
}
impl std::fmt::Debug for JitDfa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return f
            .debug_struct("JitDfa")
            .field("states", &self.dfa.state_count())
            .finish_non_exhaustive();
    }
}

impl Automaton for JitDfa {
    fn start_state(&self, context: LookContext) -> Result<StateID, CacheFull> {
        return self.dfa.start_state(context);
    }
    fn next_state(&self, state: StateID, byte: u8) -> Result<StateID, CacheFull> {
        return self.dfa.next_state(state, byte);
    }
    fn next_eoi_state(&self, state: StateID) -> Result<StateID, CacheFull> {
        return self.dfa.next_eoi_state(state);
    }
    fn is_match_state(&self, state: StateID) -> bool {
        return self.dfa.is_match_state(state);
    }
    fn is_dead_state(&self, state: StateID) -> bool {
        return self.dfa.is_dead_state(state);
    }
    fn is_start_state(&self, state: StateID) -> bool {
        return self.dfa.is_start_state(state);
    }
}
impl Engine for JitDfa {
    fn run(
        &self,
        haystack: &[u8],
        pos: usize,
        end: usize,
        state: StateID,
        earliest: bool,
        restart: bool,
    ) -> Result<RunOutcome, CacheFull> {
        let end = end.min(haystack.len());
        let mut out = JitOutcome::default();
        let flags = (earliest as u32 * EARLIEST) | (restart as u32 * RESTART);
        // SAFETY: the generated code only reads `haystack[pos..end]`, only writes to `out`,
        // and only accepts states of `self.dfa`
        let status = unsafe {
            (self.run_fn)(
                haystack.as_ptr(),
                pos as u64,
                end as u64,
                state,
                flags,
                &mut out,
            )
        };
        let status = match status {
            0 => RunStatus::End,
            1 => RunStatus::Dead,
            2 => RunStatus::Start,
            _ => RunStatus::Match,
        };
        return Ok(RunOutcome {
            status,
            pos: out.pos as usize,
            state: out.state,
            last_match: (out.last_match != NO_MATCH).then_some(out.last_match as usize),
        });
    }
}

fn unavailable(e: impl std::fmt::Display) -> CodegenUnavailable {
    return CodegenUnavailable::new(e.to_string());
}

fn new_module() -> Result<JITModule, CodegenUnavailable> {
    let mut flag_builder = settings::builder();
    flag_builder
        .set("use_colocated_libcalls", "false")
        .map_err(unavailable)?;
    flag_builder.set("is_pic", "false").map_err(unavailable)?;
    flag_builder.set("opt_level", "speed").map_err(unavailable)?;

    let isa_builder = cranelift_native::builder()
        .map_err(|e| CodegenUnavailable::new(format!("unsupported host: {e}")))?;
    let isa = isa_builder
        .finish(settings::Flags::new(flag_builder))
        .map_err(unavailable)?;
    return Ok(JITModule::new(JITBuilder::with_isa(
        isa,
        default_libcall_names(),
    )));
}

/// Function-building state for [`JitDfa::emit`].
struct Codegen<'a, 'f> {
    builder: FunctionBuilder<'f>,
    dfa: &'a DenseDFA,
    heads: Vec<Block>,
    bodies: Vec<Block>,
    exit: Block,
    pos: Variable,
    last_match: Variable,
    restart: Variable,
    exit_state: Variable,
    status: Variable,
}
impl<'a, 'f> Codegen<'a, 'f> {
    fn new(mut builder: FunctionBuilder<'f>, dfa: &'a DenseDFA) -> Codegen<'a, 'f> {
        let heads = (0..dfa.state_count()).map(|_| builder.create_block()).collect();
        let bodies = (0..dfa.state_count()).map(|_| builder.create_block()).collect();
        let exit = builder.create_block();
        let pos = builder.declare_var(types::I64);
        let last_match = builder.declare_var(types::I64);
        let restart = builder.declare_var(types::I32);
        let exit_state = builder.declare_var(types::I32);
        let status = builder.declare_var(types::I32);
        return Codegen {
            builder,
            dfa,
            heads,
            bodies,
            exit,
            pos,
            last_match,
            restart,
            exit_state,
            status,
        };
    }

    fn emit(mut self) {
        let entry = self.builder.create_block();
        self.builder.append_block_params_for_function_params(entry);
        self.builder.switch_to_block(entry);
        let params = self.builder.block_params(entry).to_vec();
        let (haystack, pos, end, state, flags, out) =
            (params[0], params[1], params[2], params[3], params[4], params[5]);

        self.builder.def_var(self.pos, pos);
        let no_match = self.builder.ins().iconst(types::I64, NO_MATCH as i64);
        self.builder.def_var(self.last_match, no_match);
        let restart = self.builder.ins().band_imm(flags, RESTART as i64);
        self.builder.def_var(self.restart, restart);
        let zero = self.builder.ins().iconst(types::I32, 0);
        self.builder.def_var(self.exit_state, zero);
        self.builder.def_var(self.status, zero);
        let earliest = self.builder.ins().band_imm(flags, EARLIEST as i64);

        // No byte has been consumed yet, so start in the body
        let invalid = self.builder.create_block();
        let mut switch = Switch::new();
        for (state, body) in self.bodies.iter().enumerate() {
            switch.set_entry(state as u128, *body);
        }
        switch.emit(&mut self.builder, state, invalid);
        self.builder.switch_to_block(invalid);
        self.exit_with(RunStatus::Dead, DEAD);

        for state in 0..self.dfa.state_count() {
            self.emit_head(state, earliest);
            self.emit_body(state, haystack, end);
        }

        self.builder.switch_to_block(self.exit);
        let last_match = self.builder.use_var(self.last_match);
        let pos = self.builder.use_var(self.pos);
        let exit_state = self.builder.use_var(self.exit_state);
        let status = self.builder.use_var(self.status);
        let flags = MemFlags::trusted();
        self.builder.ins().store(flags, last_match, out, 0);
        self.builder.ins().store(flags, pos, out, 8);
        self.builder.ins().store(flags, exit_state, out, 16);
        self.builder.ins().return_(&[status]);

        self.builder.seal_all_blocks();
        self.builder.finalize();
    }

    fn emit_head(&mut self, state: usize, earliest: cranelift_codegen::ir::Value) {
        self.builder.switch_to_block(self.heads[state]);
        let body = self.bodies[state];
        if self.dfa.is_match_state(state as StateID) {
            let pos = self.builder.use_var(self.pos);
            let end = self.builder.ins().iadd_imm(pos, -1);
            self.builder.def_var(self.last_match, end);
            let zero = self.builder.ins().iconst(types::I32, 0);
            self.builder.def_var(self.restart, zero);

            let stop = self.builder.create_block();
            self.builder.ins().brif(earliest, stop, &[], body, &[]);
            self.builder.switch_to_block(stop);
            self.exit_with(RunStatus::Match, state as StateID);
        } else if state as StateID == DEAD {
            self.exit_with(RunStatus::Dead, DEAD);
        } else if self.dfa.is_start_state(state as StateID) {
            let restart = self.builder.use_var(self.restart);
            let stop = self.builder.create_block();
            self.builder.ins().brif(restart, stop, &[], body, &[]);
            self.builder.switch_to_block(stop);
            self.exit_with(RunStatus::Start, state as StateID);
        } else {
            self.builder.ins().jump(body, &[]);
        }
    }

    fn emit_body(
        &mut self,
        state: usize,
        haystack: cranelift_codegen::ir::Value,
        end: cranelift_codegen::ir::Value,
    ) {
        self.builder.switch_to_block(self.bodies[state]);
        let pos = self.builder.use_var(self.pos);
        let at_end = self
            .builder
            .ins()
            .icmp(IntCC::UnsignedGreaterThanOrEqual, pos, end);
        let read = self.builder.create_block();
        let stop = self.builder.create_block();
        self.builder.ins().brif(at_end, stop, &[], read, &[]);
        self.builder.switch_to_block(stop);
        self.exit_with(RunStatus::End, state as StateID);

        self.builder.switch_to_block(read);
        let addr = self.builder.ins().iadd(haystack, pos);
        let byte = self
            .builder
            .ins()
            .uload8(types::I32, MemFlags::trusted(), addr, 0);
        let next_pos = self.builder.ins().iadd_imm(pos, 1);
        self.builder.def_var(self.pos, next_pos);

        let runs = self.dfa.byte_runs(state as StateID);
        let last = runs.len() - 1;
        for (i, (range, target)) in runs.into_iter().enumerate() {
            let head = self.heads[target as usize];
            if i == last {
                self.builder.ins().jump(head, &[]);
                break;
            }
            let next = self.builder.create_block();
            let below = self
                .builder
                .ins()
                .icmp_imm(IntCC::UnsignedLessThanOrEqual, byte, *range.end() as i64);
            self.builder.ins().brif(below, head, &[], next, &[]);
            self.builder.switch_to_block(next);
        }
    }

    fn exit_with(&mut self, status: RunStatus, state: StateID) {
        let status = self.builder.ins().iconst(types::I32, status as i64);
        self.builder.def_var(self.status, status);
        let state = self.builder.ins().iconst(types::I32, state as i64);
        self.builder.def_var(self.exit_state, state);
        self.builder.ins().jump(self.exit, &[]);
    }
}
