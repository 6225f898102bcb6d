//! PLAYSOUND requests backed by the embedder's audio player.

use std::sync::Arc;

use opal_abi::{PlaybackTask, ResponseValue, SoundPlayer};
use opal_lib::{klog_debug, klog_warn};
use opal_sched::{Completer, RequestHooks};

/// Starts playback when the request is registered and stops it on cancel
pub struct SoundRequest {
    player: Arc<dyn SoundPlayer>,
    samples: Option<Vec<u8>>,
    task: Option<Box<dyn PlaybackTask>>,
}

impl SoundRequest {
    pub fn new(player: Arc<dyn SoundPlayer>, samples: Vec<u8>) -> Self {
        Self {
            player,
            samples: Some(samples),
            task: None,
        }
    }
}

impl RequestHooks for SoundRequest {
    fn start(&mut self, completer: Completer) {
        let Some(samples) = self.samples.take() else {
            return;
        };
        klog_debug!("sound: request {} plays {} bytes", completer.handle(), samples.len());
        self.task = Some(self.player.play(
            samples,
            Box::new(move |outcome| {
                let value = match outcome {
                    Ok(()) => ResponseValue::Completed,
                    Err(err) => {
                        klog_warn!("sound: playback failed: {}", err);
                        ResponseValue::Error(err)
                    }
                };
                completer.try_complete(value);
            }),
        ));
    }

    fn cancel(&mut self) {
        if let Some(mut task) = self.task.take() {
            task.cancel();
        }
    }
}
