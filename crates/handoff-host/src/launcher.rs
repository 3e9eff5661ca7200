//! Native process launcher

use async_trait::async_trait;
use handoff_host_api::{
    ExitStatus, HostResult, LaunchReceipt, LaunchSpec, ProcessLauncher,
};
use tracing::{debug, info};

use crate::process::{
    ensure_runnable, invocation_for, render_command_line, run_to_exit, start_detached,
};
use crate::terminal::TerminalResolver;

/// Launches processes on the host OS
#[derive(Debug, Clone, Default)]
pub struct SystemLauncher {
    terminals: TerminalResolver,
}

impl SystemLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_terminal_resolver(terminals: TerminalResolver) -> Self {
        Self { terminals }
    }
}

#[async_trait]
impl ProcessLauncher for SystemLauncher {
    async fn run(
        &self,
        spec: &LaunchSpec,
        on_line: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> HostResult<ExitStatus> {
        let invocation = invocation_for(spec);
        debug!(
            program = %invocation.program,
            args = ?invocation.args,
            capture = spec.redirect_output,
            "Running process"
        );

        let status = run_to_exit(&invocation, spec.redirect_output, on_line).await?;
        debug!(label = %spec.label(), code = ?status.code, signal = ?status.signal, "Process exited");
        Ok(status)
    }

    async fn spawn_detached(&self, spec: &LaunchSpec) -> HostResult<Option<LaunchReceipt>> {
        ensure_runnable(&spec.executable)?;

        let invocation = if spec.interactive_terminal && cfg!(target_os = "linux") {
            let Some(terminal) = self.terminals.resolve().await else {
                return Ok(None);
            };
            terminal.invocation(render_command_line(spec))
        } else {
            invocation_for(spec)
        };

        debug!(program = %invocation.program, args = ?invocation.args, "Starting detached process");
        let pid = start_detached(&invocation)?;
        info!(pid = pid, label = %spec.label(), "Detached process started");

        Ok(Some(LaunchReceipt { pid }))
    }
}
