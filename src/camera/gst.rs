use super::{CameraDevice, FacingMode, VideoStream};
use crate::config::CameraConfig;
use crate::error::DeviceError;
use crate::media::{FrameFormat, VideoFrame};
use async_trait::async_trait;
use gstreamer::prelude::*;
use gstreamer::{ClockTime, Pipeline, State};
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::io::ErrorKind;
use tracing::{debug, info, trace, warn};

/// V4L2 cameras through a GStreamer pipeline, one device index per facing mode
pub struct GstCameraDevice {
    config: CameraConfig,
}

impl GstCameraDevice {
    pub fn new(config: CameraConfig) -> Result<Self, DeviceError> {
        gstreamer::init().map_err(|e| DeviceError::Backend {
            details: format!("Failed to initialize GStreamer: {}", e),
        })?;

        Ok(Self { config })
    }

    /// Build GStreamer pipeline string producing packed RGB frames
    fn build_pipeline_string(device_path: &str) -> String {
        format!(
            "v4l2src device={} ! \
             videoconvert ! video/x-raw,format=RGB ! \
             appsink name=sink sync=false max-buffers=1 drop=true enable-last-sample=false",
            device_path
        )
    }

    /// Surface missing devices and permission problems before building a pipeline
    fn probe_device(device_path: &str, facing: FacingMode) -> Result<(), DeviceError> {
        match std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(device_path)
        {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                Err(DeviceError::PermissionDenied { facing })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(DeviceError::NotFound {
                facing,
                details: format!("{} does not exist", device_path),
            }),
            Err(e) => Err(DeviceError::NotFound {
                facing,
                details: format!("{}: {}", device_path, e),
            }),
        }
    }
}

#[async_trait]
impl CameraDevice for GstCameraDevice {
    async fn open(&self, facing: FacingMode) -> Result<Box<dyn VideoStream>, DeviceError> {
        let device_path = format!("/dev/video{}", self.config.device_for(facing));
        Self::probe_device(&device_path, facing)?;

        let pipeline_desc = Self::build_pipeline_string(&device_path);
        info!("Creating GStreamer pipeline: {}", pipeline_desc);

        let (pipeline, appsink) =
            tokio::task::spawn_blocking(move || start_pipeline(&pipeline_desc, facing))
                .await
                .map_err(|e| DeviceError::Backend {
                    details: format!("pipeline start task failed: {}", e),
                })??;

        Ok(Box::new(GstStream {
            pipeline,
            appsink,
            dimensions: (0, 0),
            stopped: false,
        }))
    }

    fn name(&self) -> &str {
        "gstreamer"
    }
}

fn start_pipeline(
    pipeline_desc: &str,
    facing: FacingMode,
) -> Result<(Pipeline, AppSink), DeviceError> {
    let pipeline = gstreamer::parse::launch(pipeline_desc)
        .map_err(|e| DeviceError::Backend {
            details: format!("Failed to create pipeline: {}", e),
        })?
        .downcast::<Pipeline>()
        .map_err(|_| DeviceError::Backend {
            details: "Failed to downcast to Pipeline".to_string(),
        })?;

    let appsink = pipeline
        .by_name("sink")
        .ok_or_else(|| DeviceError::Backend {
            details: "Failed to get appsink".to_string(),
        })?
        .downcast::<AppSink>()
        .map_err(|_| DeviceError::Backend {
            details: "Failed to downcast to AppSink".to_string(),
        })?;

    if let Err(e) = pipeline.set_state(State::Playing) {
        let _ = pipeline.set_state(State::Null);
        return Err(DeviceError::NotFound {
            facing,
            details: format!("Failed to start pipeline: {}", e),
        });
    }

    let (result, current, _) = pipeline.state(ClockTime::from_seconds(5));
    if let Err(e) = result {
        let _ = pipeline.set_state(State::Null);
        return Err(DeviceError::NotFound {
            facing,
            details: format!("Pipeline did not reach Playing: {}", e),
        });
    }

    debug!("GStreamer pipeline state: {:?}", current);
    Ok((pipeline, appsink))
}

struct GstStream {
    pipeline: Pipeline,
    appsink: AppSink,
    dimensions: (u32, u32),
    stopped: bool,
}

impl VideoStream for GstStream {
    fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    fn read_frame(&mut self) -> Result<VideoFrame, DeviceError> {
        if self.stopped {
            return Err(DeviceError::NoStream);
        }

        let Some(sample) = self.appsink.try_pull_sample(ClockTime::from_mseconds(500)) else {
            trace!("No sample available yet");
            return Ok(VideoFrame::new(Vec::new(), 0, 0, FrameFormat::Rgb24));
        };

        let caps = sample.caps().ok_or_else(|| DeviceError::Backend {
            details: "No caps in sample".to_string(),
        })?;
        let video_info = VideoInfo::from_caps(caps).map_err(|e| DeviceError::Backend {
            details: format!("Failed to get video info: {}", e),
        })?;
        let buffer = sample.buffer().ok_or_else(|| DeviceError::Backend {
            details: "No buffer in sample".to_string(),
        })?;
        let map = buffer.map_readable().map_err(|e| DeviceError::Backend {
            details: format!("Failed to map buffer: {}", e),
        })?;

        let width = video_info.width();
        let height = video_info.height();
        let stride = video_info.stride()[0] as usize;
        let row_len = width as usize * 3;
        let src = map.as_slice();

        // Rows may be padded to the stride
        let mut data = Vec::with_capacity(row_len * height as usize);
        for row in 0..height as usize {
            let start = row * stride;
            let end = start + row_len;
            if end > src.len() {
                return Err(DeviceError::Backend {
                    details: format!(
                        "Short buffer: row {} ends at {} but buffer holds {} bytes",
                        row,
                        end,
                        src.len()
                    ),
                });
            }
            data.extend_from_slice(&src[start..end]);
        }

        self.dimensions = (width, height);
        Ok(VideoFrame::new(data, width, height, FrameFormat::Rgb24))
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        if let Err(e) = self.pipeline.set_state(State::Null) {
            warn!("Failed to stop GStreamer pipeline: {}", e);
        } else {
            info!("GStreamer camera pipeline stopped");
        }
    }
}
