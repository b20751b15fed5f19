//! Fake ffmpeg/ffprobe executables for process-level tests.

#![allow(dead_code)]

use discord_media_tool::models::config::Config;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Which pass of the fake ffmpeg exits non-zero.
#[derive(Clone, Copy)]
pub enum FailAt {
    Never,
    Pass(u8),
}

/// A scratch directory with fake tools, an input file and a work dir.
pub struct Sandbox {
    pub dir: TempDir,
    pub work_dir: PathBuf,
    pub input: PathBuf,
    pub invocations: PathBuf,
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Sandbox {
    pub fn new(probe_json: &str) -> Self {
        Self::with_ffmpeg(probe_json, FailAt::Never, false, true)
    }

    /// `slow` makes every encoding pass sleep; `mbtree` controls whether pass 1
    /// writes the `.mbtree` file (x264 does, libvpx does not).
    pub fn with_ffmpeg(probe_json: &str, fail: FailAt, slow: bool, mbtree: bool) -> Self {
        let dir = TempDir::new().unwrap();
        let work_dir = dir.path().join("work");
        std::fs::create_dir_all(&work_dir).unwrap();

        let input = dir.path().join("clip.mov");
        std::fs::write(&input, b"not really a video").unwrap();

        let json_path = dir.path().join("probe.json");
        std::fs::write(&json_path, probe_json).unwrap();

        let invocations = dir.path().join("invocations.log");

        let ffprobe = dir.path().join("ffprobe");
        write_script(
            &ffprobe,
            &format!(
                "#!/bin/sh\nif [ \"$1\" = \"-version\" ]; then echo 'ffprobe version fake'; exit 0; fi\ncat '{}'\n",
                json_path.display()
            ),
        );

        let fail_pass = match fail {
            FailAt::Never => "none".to_string(),
            FailAt::Pass(n) => n.to_string(),
        };
        let mbtree_line = if mbtree {
            ": > ffmpeg2pass-0.log.mbtree\n"
        } else {
            ""
        };
        let sleep_line = if slow { "exec sleep 30\n" } else { "" };

        let ffmpeg = dir.path().join("ffmpeg");
        write_script(
            &ffmpeg,
            &format!(
                r#"#!/bin/sh
if [ "$1" = "-version" ]; then echo 'ffmpeg version fake'; exit 0; fi
echo "$@" >> '{log}'
pass=0
prev=
last=
for arg in "$@"; do
  if [ "$prev" = "-pass" ]; then pass=$arg; fi
  prev=$arg
  last=$arg
done
if [ "$pass" = "{fail}" ]; then echo "fake encoder error" >&2; exit 1; fi
if [ "$pass" = "1" ]; then
  : > ffmpeg2pass-0.log
  {mbtree}else
  echo encoded > "$last"
fi
{sleep}exit 0
"#,
                log = invocations.display(),
                fail = fail_pass,
                mbtree = mbtree_line,
                sleep = sleep_line,
            ),
        );

        Self {
            dir,
            work_dir,
            input,
            invocations,
            ffmpeg,
            ffprobe,
        }
    }

    /// Replace ffprobe with one that records its pid and never finishes.
    /// Returns the pid file.
    pub fn hang_ffprobe(&self) -> PathBuf {
        let pid_file = self.dir.path().join("ffprobe.pid");
        write_script(
            &self.ffprobe,
            &format!(
                "#!/bin/sh\nif [ \"$1\" = \"-version\" ]; then echo 'ffprobe version fake'; exit 0; fi\necho $$ > '{}'\nexec sleep 30\n",
                pid_file.display()
            ),
        );
        pid_file
    }

    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.tools.ffmpeg = self.ffmpeg.clone();
        config.tools.ffprobe = self.ffprobe.clone();
        config.tools.work_dir = self.work_dir.clone();
        config
    }

    /// Lines the fake ffmpeg recorded, one per invocation.
    pub fn invocations(&self) -> Vec<String> {
        std::fs::read_to_string(&self.invocations)
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn passlog(&self) -> PathBuf {
        self.work_dir.join("ffmpeg2pass-0.log")
    }

    pub fn mbtree(&self) -> PathBuf {
        self.work_dir.join("ffmpeg2pass-0.log.mbtree")
    }
}

/// Whether `pid` is a live (non-zombie) process.
pub fn process_alive(pid: u32) -> bool {
    let output = Command::new("ps")
        .args(["-o", "stat=", "-p", &pid.to_string()])
        .output();
    match output {
        Ok(out) if out.status.success() => {
            let stat = String::from_utf8_lossy(&out.stdout);
            !stat.trim().is_empty() && !stat.trim().starts_with('Z')
        }
        _ => false,
    }
}

fn write_script(path: &Path, content: &str) {
    std::fs::write(path, content).unwrap();
    let mut perms = std::fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).unwrap();

    // Another test thread forking while the file was open for writing can
    // make exec fail with ETXTBSY for a short while.
    for _ in 0..50 {
        match Command::new(path).arg("-version").output() {
            Err(e) if e.raw_os_error() == Some(26) => {
                std::thread::sleep(std::time::Duration::from_millis(20))
            }
            _ => return,
        }
    }
}

pub const VIDEO_JSON: &str = r#"{
    "streams": [
        {"index": 0, "codec_name": "h264", "codec_type": "video", "width": 1920, "height": 1080},
        {"index": 1, "codec_name": "aac", "codec_type": "audio", "channels": 2}
    ],
    "format": {"duration": "60.000000"}
}"#;

pub const SILENT_VIDEO_JSON: &str = r#"{
    "streams": [
        {"index": 0, "codec_name": "h264", "codec_type": "video", "width": 640, "height": 480}
    ],
    "format": {"duration": "12.500000"}
}"#;
