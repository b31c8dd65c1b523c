use std::process::Output;
use std::time::Duration;

/// Create a [`tokio::process::Command`] that does **not** flash a console
/// window on Windows and is killed if its future is dropped.
pub fn command(program: &str) -> tokio::process::Command {
    #![allow(unused_mut)]
    let mut cmd = tokio::process::Command::new(program);
    #[cfg(windows)]
    {
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
    cmd.kill_on_drop(true);
    cmd
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} did not finish within {}s", .timeout.as_secs_f32())]
    TimedOut { program: String, timeout: Duration },
}

/// Run `cmd` to completion, killing it once `timeout` elapses.
pub async fn output_with_timeout(
    cmd: &mut tokio::process::Command,
    timeout: Duration,
) -> Result<Output, CommandError> {
    let program = cmd.as_std().get_program().to_string_lossy().into_owned();
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(source)) => Err(CommandError::Spawn { program, source }),
        Err(_) => {
            log::warn!("{} timed out after {:?}", program, timeout);
            Err(CommandError::TimedOut { program, timeout })
        }
    }
}
