use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use spin::Mutex;

use opal_abi::{
    Bitmap, BitmapMode, FileStat, FontDescriptor, FontMetrics, FsHandler, FsOperation, FsResult, Glyph,
    GlyphProvider, OplError, OplResult, PlaybackDone, PlaybackTask, Size, SoundPlayer,
};
use opal_lib::RuntimeConfig;
use opal_runtime::Runtime;
use opal_video::WindowServer;

pub const FIXED_FONT: FontDescriptor = FontDescriptor::new(0x0100_0001);
pub const FIXED_FONT_PATH: &str = "fixed.fon";

/// 5×8 cell font: every printable glyph is a solid 4×6 block, space is blank
pub struct FixedFont;

impl GlyphProvider for FixedFont {
    fn metrics(&self, font: &FontDescriptor) -> Option<FontMetrics> {
        (*font == FIXED_FONT).then_some(FontMetrics {
            height: 8,
            ascent: 7,
            descent: 1,
            max_width: 5,
        })
    }

    fn glyph(&self, font: &FontDescriptor, ch: char) -> Option<Glyph> {
        if *font != FIXED_FONT {
            return None;
        }
        // Gray2 rows, LSB first, 0 = black
        let mut rows = vec![0xFFu8; 8];
        if !ch.is_whitespace() {
            for row in rows.iter_mut().take(7).skip(1) {
                *row = 0b1111_0000;
            }
        }
        Some(Glyph {
            bitmap: Bitmap {
                width: 5,
                height: 8,
                stride: 1,
                mode: BitmapMode::Gray2,
                data: rows,
            },
            advance: 5,
        })
    }

    fn load_font(&self, path: &str) -> OplResult<FontDescriptor> {
        if path == FIXED_FONT_PATH {
            Ok(FIXED_FONT)
        } else {
            Err(OplError::NotExists)
        }
    }
}

struct RecordedTask {
    stopped: Arc<AtomicBool>,
}

impl PlaybackTask for RecordedTask {
    fn cancel(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

struct Playback {
    samples: Vec<u8>,
    done: Option<PlaybackDone>,
    stopped: Arc<AtomicBool>,
}

/// Records every playback and finishes it only through `finish`
#[derive(Default)]
pub struct RecordingPlayer {
    playbacks: Mutex<Vec<Playback>>,
}

impl RecordingPlayer {
    pub fn played(&self) -> Vec<Vec<u8>> {
        self.playbacks.lock().iter().map(|p| p.samples.clone()).collect()
    }

    pub fn stopped(&self, index: usize) -> bool {
        self.playbacks
            .lock()
            .get(index)
            .is_some_and(|p| p.stopped.load(Ordering::SeqCst))
    }

    /// Report the end of playback `index`; false if it already ended
    pub fn finish(&self, index: usize, outcome: Result<(), OplError>) -> bool {
        let done = self.playbacks.lock().get_mut(index).and_then(|p| p.done.take());
        match done {
            Some(done) => {
                done(outcome);
                true
            }
            None => false,
        }
    }
}

impl SoundPlayer for RecordingPlayer {
    fn play(&self, samples: Vec<u8>, done: PlaybackDone) -> Box<dyn PlaybackTask> {
        let stopped = Arc::new(AtomicBool::new(false));
        self.playbacks.lock().push(Playback {
            samples,
            done: Some(done),
            stopped: Arc::clone(&stopped),
        });
        Box::new(RecordedTask { stopped })
    }
}

#[derive(Default)]
struct MemoryTree {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
}

impl MemoryTree {
    fn parent_exists(&self, path: &str) -> bool {
        match path.rsplit_once('/') {
            Some((parent, _)) => parent.is_empty() || self.dirs.contains(parent),
            None => true,
        }
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path) || self.dirs.contains(path)
    }

    fn children(&self, dir: &str) -> Vec<String> {
        let prefix = format!("{}/", dir);
        self.files
            .keys()
            .chain(self.dirs.iter())
            .filter_map(|p| p.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect()
    }
}

/// Flat in-memory file system with `/`-separated paths
#[derive(Default)]
pub struct MemoryFs {
    tree: Mutex<MemoryTree>,
}

impl MemoryFs {
    pub fn with_file(self, path: &str, data: &[u8]) -> Self {
        self.tree.lock().files.insert(path.into(), data.to_vec());
        self
    }

    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.tree.lock().files.get(path).cloned()
    }
}

impl FsHandler for MemoryFs {
    fn perform(&self, op: &FsOperation) -> OplResult<FsResult> {
        let mut tree = self.tree.lock();
        match op {
            FsOperation::Exists(path) => Ok(FsResult::Exists(tree.exists(path))),
            FsOperation::Read(path) => tree
                .files
                .get(path)
                .cloned()
                .map(FsResult::Data)
                .ok_or(OplError::NotExists),
            FsOperation::Write { path, data } => {
                if !tree.parent_exists(path) || tree.dirs.contains(path) {
                    return Err(OplError::WriteFailed);
                }
                tree.files.insert(path.clone(), data.clone());
                Ok(FsResult::Done)
            }
            FsOperation::Dir(path) => {
                if !path.is_empty() && !tree.dirs.contains(path) {
                    return Err(OplError::NotExists);
                }
                Ok(FsResult::Entries(tree.children(path)))
            }
            FsOperation::Stat(path) => {
                if tree.dirs.contains(path) {
                    return Ok(FsResult::Stat(FileStat {
                        is_dir: true,
                        ..FileStat::default()
                    }));
                }
                let data = tree.files.get(path).ok_or(OplError::NotExists)?;
                Ok(FsResult::Stat(FileStat {
                    size: data.len() as u64,
                    ..FileStat::default()
                }))
            }
            FsOperation::Rename { from, to } => {
                if tree.exists(to) {
                    return Err(OplError::AlreadyExists);
                }
                let data = tree.files.remove(from).ok_or(OplError::NotExists)?;
                tree.files.insert(to.clone(), data);
                Ok(FsResult::Done)
            }
            FsOperation::Mkdir(path) => {
                if tree.exists(path) {
                    return Err(OplError::AlreadyExists);
                }
                if !tree.parent_exists(path) {
                    return Err(OplError::NotExists);
                }
                tree.dirs.insert(path.clone());
                Ok(FsResult::Done)
            }
            FsOperation::Rmdir(path) => {
                if !tree.dirs.contains(path) {
                    return Err(OplError::NotExists);
                }
                if !tree.children(path).is_empty() {
                    return Err(OplError::InUse);
                }
                tree.dirs.remove(path);
                Ok(FsResult::Done)
            }
            FsOperation::Delete(path) => tree
                .files
                .remove(path)
                .map(|_| FsResult::Done)
                .ok_or(OplError::NotExists),
        }
    }
}

/// Small screen so composites stay cheap
pub fn test_config() -> RuntimeConfig {
    RuntimeConfig {
        screen: Size::new(160, 80),
        ..RuntimeConfig::default()
    }
}

pub fn test_server() -> WindowServer {
    WindowServer::new(test_config(), Arc::new(FixedFont))
}

pub struct TestRuntime {
    pub runtime: Runtime,
    pub sound: Arc<RecordingPlayer>,
    pub fs: Arc<MemoryFs>,
}

pub fn test_runtime(config: RuntimeConfig, fs: MemoryFs) -> TestRuntime {
    let sound = Arc::new(RecordingPlayer::default());
    let fs = Arc::new(fs);
    let runtime = match Runtime::new(config, Arc::new(FixedFont), sound.clone(), fs.clone()) {
        Ok(runtime) => runtime,
        Err(err) => panic!("runtime failed to start: {}", err),
    };
    TestRuntime { runtime, sound, fs }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_fs_round_trips_through_directories() {
        let fs = MemoryFs::default();
        fs.perform(&FsOperation::Mkdir("docs".into())).unwrap();
        fs.perform(&FsOperation::Write {
            path: "docs/a.txt".into(),
            data: b"hello".to_vec(),
        })
        .unwrap();
        assert_eq!(
            fs.perform(&FsOperation::Dir("docs".into())),
            Ok(FsResult::Entries(vec!["a.txt".into()]))
        );
        assert_eq!(
            fs.perform(&FsOperation::Rmdir("docs".into())),
            Err(OplError::InUse)
        );
        fs.perform(&FsOperation::Rename {
            from: "docs/a.txt".into(),
            to: "docs/b.txt".into(),
        })
        .unwrap();
        assert_eq!(fs.contents("docs/b.txt"), Some(b"hello".to_vec()));
        assert_eq!(
            fs.perform(&FsOperation::Stat("docs/b.txt".into())),
            Ok(FsResult::Stat(FileStat {
                size: 5,
                ..FileStat::default()
            }))
        );
    }

    #[test]
    fn fixed_font_loads_by_path() {
        assert_eq!(FixedFont.load_font(FIXED_FONT_PATH), Ok(FIXED_FONT));
        assert_eq!(FixedFont.load_font("other.fon"), Err(OplError::NotExists));
    }
}
