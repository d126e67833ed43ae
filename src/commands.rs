//! CLI Command Handlers
//!
//! Each handler takes its parsed arguments and the Output, returns ExitCode.

use serde::Serialize;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

use crate::api::{HttpSourceResolver, ResolveError, SourceResolver};
use crate::captions::{parse_webvtt, srt_to_webvtt};
use crate::cli::{ConvertCmd, ExitCode, Output, ResolveCmd};
use crate::config::Config;

// =============================================================================
// Resolve Command
// =============================================================================

pub async fn resolve_cmd(cmd: ResolveCmd, config: &Config, output: &Output) -> ExitCode {
    let request = cmd
        .item
        .request(config.provider.clone(), &config.server_preferences);
    let resolver = HttpSourceResolver::with_base_url(&config.resolver_url);

    output.info(format!("Resolving {} {}", request.media_type.as_str(), request.item_id));
    debug!(url = %resolver.request_url(&request), "resolve");

    match resolver.resolve(&request).await {
        Ok(resolution) if resolution.links.is_empty() => {
            output.error("No playable links found", ExitCode::NoStreams)
        }
        Ok(resolution) => {
            if let Err(e) = output.print(&resolution) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        Err(ResolveError::NotFound) => output.error("No playable links found", ExitCode::NoStreams),
        Err(e) => {
            warn!(error = %e, "resolution failed");
            output.error(format!("Resolution failed: {}", e), ExitCode::NetworkError)
        }
    }
}

// =============================================================================
// Convert Command
// =============================================================================

#[derive(Debug, Serialize)]
struct Converted {
    cues: usize,
    webvtt: String,
}

pub fn convert_cmd(cmd: ConvertCmd, output: &Output) -> ExitCode {
    let srt = match read_input(&cmd.input) {
        Ok(s) => s,
        Err(e) => {
            return output.error(
                format!("Could not read {}: {}", cmd.input.display(), e),
                ExitCode::InvalidArgs,
            )
        }
    };

    let vtt = match srt_to_webvtt(&srt) {
        Ok(vtt) => vtt,
        Err(e) => return output.error(format!("Conversion failed: {}", e), ExitCode::CaptionFailed),
    };

    if let Some(path) = &cmd.output {
        if let Err(e) = std::fs::write(path, &vtt) {
            return output.error(format!("Could not write {}: {}", path.display(), e), ExitCode::Error);
        }
        output.info(format!("Wrote {}", path.display()));
        return ExitCode::Success;
    }

    if output.json {
        let converted = Converted {
            cues: parse_webvtt(&vtt).len(),
            webvtt: vtt,
        };
        if let Err(e) = output.print(converted) {
            return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
        }
    } else {
        print!("{}", vtt);
    }
    ExitCode::Success
}

/// Read a file, or stdin for `-`
fn read_input(path: &Path) -> std::io::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn quiet() -> Output {
        Output {
            json: false,
            quiet: true,
        }
    }

    #[test]
    fn test_convert_writes_output_file() {
        let dir = std::env::temp_dir().join(format!("streamtv-convert-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("in.srt");
        let out = dir.join("out.vtt");
        std::fs::write(&input, "1\n00:00:01,000 --> 00:00:02,500\nHello\n").unwrap();

        let code = convert_cmd(
            ConvertCmd {
                input,
                output: Some(out.clone()),
            },
            &quiet(),
        );
        assert_eq!(code, ExitCode::Success);
        let vtt = std::fs::read_to_string(&out).unwrap();
        assert!(vtt.starts_with("WEBVTT"));
        assert!(vtt.contains("00:00:01.000 --> 00:00:02.500"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_convert_missing_file() {
        let code = convert_cmd(
            ConvertCmd {
                input: PathBuf::from("/definitely/not/here.srt"),
                output: None,
            },
            &quiet(),
        );
        assert_eq!(code, ExitCode::InvalidArgs);
    }
}
