//! Hands a rendered meme to the operating system's print spooler.
//! There is no pagination or scaling of our own; the spooler decides.

use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{MemeError, Result};
use crate::render;

/// Writes `image` to a PNG in the temp directory and submits it for printing.
///
/// Returns the path of the file that was sent.
pub fn print_image(image: &RgbaImage) -> Result<PathBuf> {
    let path = spool_path();
    render::save_png(image, &path)?;
    submit(&path)?;
    Ok(path)
}

fn spool_path() -> PathBuf {
    std::env::temp_dir().join(format!("memeframe-print-{}.png", std::process::id()))
}

/// The command that prints `path` on this platform.
pub fn print_command(path: &Path) -> Command {
    if cfg!(target_os = "windows") {
        let mut cmd = Command::new("mspaint");
        cmd.arg("/p").arg(path);
        cmd
    } else {
        let mut cmd = Command::new("lp");
        cmd.arg(path);
        cmd
    }
}

fn submit(path: &Path) -> Result<()> {
    let mut cmd = print_command(path);
    log::debug!("running {:?}", cmd);
    let output = cmd.output().map_err(|e| MemeError::Print(format!("could not start print command: {e}")))?;
    if output.status.success() {
        log::info!("print job submitted: {}", String::from_utf8_lossy(&output.stdout).trim());
        Ok(())
    } else {
        Err(MemeError::Print(format!(
            "{} ({})",
            String::from_utf8_lossy(&output.stderr).trim(),
            output.status
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_command_passes_the_file() {
        let cmd = print_command(Path::new("/tmp/meme.png"));
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args.last().map(String::as_str), Some("/tmp/meme.png"));
    }

    #[test]
    fn spool_file_is_png_in_temp_dir() {
        let path = spool_path();
        assert!(path.starts_with(std::env::temp_dir()));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));
    }
}
