use super::{Completion, TextRecognizer};
use crate::{Error, Result};
use std::io::Write;
use tokio::process::Command;

/// Runs the `tesseract` command-line tool on a temporary copy of the image.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: String,
    lang: String,
}

impl TesseractEngine {
    pub fn new(binary: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            lang: lang.into(),
        }
    }

    async fn run(binary: String, lang: String, image: Vec<u8>) -> Result<String> {
        let mut input = tempfile::NamedTempFile::new()?;
        input.write_all(&image)?;
        input.flush()?;

        tracing::debug!(
            "Running {} on {} ({} bytes)",
            binary,
            input.path().display(),
            image.len()
        );

        let output = Command::new(&binary)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&lang)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::error!("{} exited with {}: {}", binary, output.status, stderr);
            return Err(Error::Recognition(format!(
                "{} exited with {}: {}",
                binary, output.status, stderr
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new("tesseract", "eng")
    }
}

impl TextRecognizer for TesseractEngine {
    fn recognize(&self, image: Vec<u8>, done: Completion) {
        let binary = self.binary.clone();
        let lang = self.lang.clone();

        tokio::spawn(async move {
            done(Self::run(binary, lang, image).await);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::recognize_text;

    #[tokio::test]
    async fn test_missing_binary_reports_error() {
        let engine = TesseractEngine::new("/nonexistent/tesseract-binary", "eng");

        let result = recognize_text(&engine, vec![0x89, 0x50, 0x4E, 0x47]).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_reads_text_from_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "echo \"recognized $4\"\n");

        let engine = TesseractEngine::new(script, "eng");
        let text = recognize_text(&engine, b"img".to_vec()).await.unwrap();

        assert_eq!(text.trim(), "recognized eng");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_recognition_error() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "echo 'Error in pixReadMem' >&2\nexit 1\n");

        let engine = TesseractEngine::new(script, "eng");
        let err = recognize_text(&engine, vec![]).await.unwrap_err();

        assert!(matches!(err, Error::Recognition(_)));
        assert!(err.to_string().contains("pixReadMem"));
    }

    #[cfg(unix)]
    fn write_script(dir: &std::path::Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-tesseract");
        std::fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }
}
