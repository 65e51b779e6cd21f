#![allow(dead_code)]

use std::{
    collections::BTreeMap,
    io::Cursor,
    sync::{Arc, Mutex, mpsc},
};

use scenereel::{EngineConfig, OUTPUT_FILE, ReelError, ReelResult, SceneSource, TranscodeEngine};

/// Knobs and observations shared between a test and its [`FakeEngine`].
#[derive(Debug, Default)]
pub struct FakeState {
    pub loaded: bool,
    pub load_calls: usize,
    pub load_failures_left: usize,
    pub files: BTreeMap<String, Vec<u8>>,
    pub ops: Vec<String>,
    pub executed: Vec<Vec<String>>,
    pub fail_write: Option<String>,
    pub fail_execute: bool,
    pub empty_output: bool,
}

/// In-memory engine: files live in a map, `execute` fabricates an output.
pub struct FakeEngine {
    state: Arc<Mutex<FakeState>>,
    gate: Option<(mpsc::Sender<()>, mpsc::Receiver<()>)>,
}

impl FakeEngine {
    pub fn new() -> (Self, Arc<Mutex<FakeState>>) {
        let state = Arc::new(Mutex::new(FakeState::default()));
        (
            Self {
                state: Arc::clone(&state),
                gate: None,
            },
            state,
        )
    }

    /// `execute` reports on `started` and then blocks until `release` yields.
    pub fn gated(mut self, started: mpsc::Sender<()>, release: mpsc::Receiver<()>) -> Self {
        self.gate = Some((started, release));
        self
    }
}

impl TranscodeEngine for FakeEngine {
    fn load(&mut self, _config: &EngineConfig) -> ReelResult<()> {
        let mut st = self.state.lock().unwrap();
        st.load_calls += 1;
        st.ops.push("load".to_string());
        if st.load_failures_left > 0 {
            st.load_failures_left -= 1;
            return Err(ReelError::engine_unavailable("fake engine refused to load"));
        }
        st.loaded = true;
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.state.lock().unwrap().loaded
    }

    fn write_file(&mut self, name: &str, bytes: &[u8]) -> ReelResult<()> {
        let mut st = self.state.lock().unwrap();
        if st.fail_write.as_deref() == Some(name) {
            return Err(ReelError::Other(anyhow::anyhow!("disk full")));
        }
        st.ops.push(format!("write {name}"));
        st.files.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn delete_file(&mut self, name: &str) -> ReelResult<()> {
        let mut st = self.state.lock().unwrap();
        st.ops.push(format!("delete {name}"));
        match st.files.remove(name) {
            Some(_) => Ok(()),
            None => Err(ReelError::Other(anyhow::anyhow!("no such file '{name}'"))),
        }
    }

    fn read_file(&mut self, name: &str) -> ReelResult<Vec<u8>> {
        let mut st = self.state.lock().unwrap();
        st.ops.push(format!("read {name}"));
        st.files
            .get(name)
            .cloned()
            .ok_or_else(|| ReelError::Other(anyhow::anyhow!("no such file '{name}'")))
    }

    fn execute(&mut self, args: &[String]) -> ReelResult<()> {
        if let Some((started, release)) = &self.gate {
            let _ = started.send(());
            let _ = release.recv();
        }

        let mut st = self.state.lock().unwrap();
        st.ops.push("execute".to_string());
        st.executed.push(args.to_vec());
        if st.fail_execute {
            return Err(ReelError::Other(anyhow::anyhow!("encoder crashed")));
        }
        let body = if st.empty_output {
            Vec::new()
        } else {
            format!("mp4#{}", st.executed.len()).into_bytes()
        };
        st.files.insert(OUTPUT_FILE.to_string(), body);
        Ok(())
    }
}

pub fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

pub fn image_source(name: &str) -> SceneSource {
    SceneSource::new(png_bytes(2, 2, [200, 10, 10, 255]), "image/png", name)
}
