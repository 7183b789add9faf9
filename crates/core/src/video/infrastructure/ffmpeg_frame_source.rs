use std::path::Path;

use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_source::FrameSource;

/// Pulls frames from anything libavformat can open: video files,
/// RTSP/HTTP streams, or capture devices.
///
/// Each decoded picture is converted to RGB24 at the requested output size
/// in a single swscale pass, so `resize` costs nothing extra per frame.
pub struct FfmpegFrameSource {
    stream: Option<OpenStream>,
    output_size: Option<(u32, u32)>,
}

// Safety: FfmpegFrameSource is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegFrameSource {}

struct OpenStream {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    stream_index: usize,
    scaler: Option<(ScalerKey, scaling::Context)>,
    frame_index: usize,
    flushing: bool,
    done: bool,
}

/// Source format and dimensions plus output dimensions a scaler was built for.
#[derive(Clone, Copy, PartialEq, Eq)]
struct ScalerKey {
    format: Pixel,
    src: (u32, u32),
    dst: (u32, u32),
}

impl FfmpegFrameSource {
    pub fn new() -> Self {
        Self {
            stream: None,
            output_size: None,
        }
    }
}

impl Default for FfmpegFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for FfmpegFrameSource {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        ffmpeg_next::device::register_all();

        let ictx = ffmpeg_next::format::input(path)?;
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;

        let stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let rate = stream.avg_frame_rate();
        let rate = if rate.denominator() != 0 && rate.numerator() != 0 {
            rate
        } else {
            stream.rate()
        };
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            fps,
            total_frames: stream.frames().max(0) as usize,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source_path: Some(path.to_path_buf()),
        };
        log::debug!(
            "Opened {} ({}x{} @ {:.2} fps, codec {:?})",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.codec
        );

        self.stream = Some(OpenStream {
            ictx,
            decoder,
            stream_index,
            scaler: None,
            frame_index: 0,
            flushing: false,
            done: false,
        });
        Ok(metadata)
    }

    fn current_frame(&mut self) -> Option<Result<Frame, Box<dyn std::error::Error>>> {
        let output_size = self.output_size;
        let Some(stream) = self.stream.as_mut() else {
            return Some(Err("FfmpegFrameSource: not opened".into()));
        };
        stream.next_frame(output_size)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.output_size = if width == 0 || height == 0 {
            None
        } else {
            Some((width, height))
        };
    }

    fn close(&mut self) {
        self.stream = None;
    }
}

impl OpenStream {
    fn next_frame(
        &mut self,
        output_size: Option<(u32, u32)>,
    ) -> Option<Result<Frame, Box<dyn std::error::Error>>> {
        if self.done {
            return None;
        }
        loop {
            let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                return Some(self.convert(&decoded, output_size));
            }
            if self.flushing {
                self.done = true;
                return None;
            }

            match self.ictx.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() != self.stream_index {
                        continue;
                    }
                    if let Err(e) = self.decoder.send_packet(&packet) {
                        log::debug!("Dropping undecodable packet: {e}");
                    }
                }
                None => {
                    let _ = self.decoder.send_eof();
                    self.flushing = true;
                }
            }
        }
    }

    fn convert(
        &mut self,
        decoded: &ffmpeg_next::util::frame::video::Video,
        output_size: Option<(u32, u32)>,
    ) -> Result<Frame, Box<dyn std::error::Error>> {
        let src = (decoded.width(), decoded.height());
        let key = ScalerKey {
            format: decoded.format(),
            src,
            dst: output_size.unwrap_or(src),
        };

        if self.scaler.as_ref().map(|(current, _)| *current) != Some(key) {
            let ctx = scaling::Context::get(
                key.format,
                key.src.0,
                key.src.1,
                Pixel::RGB24,
                key.dst.0,
                key.dst.1,
                scaling::Flags::BILINEAR,
            )?;
            self.scaler = Some((key, ctx));
        }
        let Some((_, scaler)) = self.scaler.as_mut() else {
            return Err("FfmpegFrameSource: scaler unavailable".into());
        };

        let mut rgb = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(decoded, &mut rgb)?;

        let (width, height) = key.dst;
        let pixels = extract_rgb_pixels(&rgb, width, height);
        let frame = Frame::new(pixels, width, height, 3, self.frame_index);
        self.frame_index += 1;
        Ok(frame)
    }
}

/// Copies an RGB24 picture into a tightly packed buffer, dropping the
/// per-row stride padding ffmpeg may add.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_bytes]);
    }
    pixels
}
