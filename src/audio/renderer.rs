use anyhow::{bail, Context};
use std::path::Path;
use std::process::{Command, Stdio};

use crate::config::PlaybackConfig;

/// Plays a file through the configured system player and waits for it to end.
pub fn play_file(path: &Path, playback: &PlaybackConfig) -> anyhow::Result<()> {
    let mut cmd = player_command(playback, path);
    let status = cmd
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .with_context(|| format!("play audio with {}: {}", playback.command, path.display()))?;

    if !status.success() {
        bail!("{} exited with status {status}", playback.command);
    }

    Ok(())
}

pub fn play_bytes(bytes: &[u8], extension: &str, playback: &PlaybackConfig) -> anyhow::Result<()> {
    let mut temp = tempfile::Builder::new()
        .prefix("matchcast-")
        .suffix(&format!(".{extension}"))
        .tempfile()
        .context("create temp file")?;
    std::io::Write::write_all(&mut temp, bytes).context("write audio bytes")?;
    play_file(temp.path(), playback)
}

fn player_command(playback: &PlaybackConfig, path: &Path) -> Command {
    let mut parts = playback.command.split_whitespace();
    let program = parts.next().unwrap_or("afplay");
    let mut cmd = Command::new(program);
    cmd.args(parts);

    match program {
        "afplay" => {
            cmd.arg("-v").arg(playback.volume.to_string());
        }
        "ffplay" => {
            let volume = (playback.volume * 100.0).round() as u32;
            cmd.args(["-nodisp", "-autoexit", "-loglevel", "quiet", "-volume"])
                .arg(volume.to_string());
        }
        _ => {}
    }

    cmd.arg(path);
    cmd
}
