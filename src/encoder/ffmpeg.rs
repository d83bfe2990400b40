use crate::config::EncoderConfig;
use crate::encoder::{FrameTransformer, Retrieved};
use crate::error::CapabilityError;
use crate::pipeline::types::{EncodedPacket, PixelFormat, RawFrame, Timestamp};
use ac_ffmpeg::codec::video::scaler::{Algorithm, VideoFrameScaler};
use ac_ffmpeg::codec::video::{VideoEncoder, VideoFrame, VideoFrameMut};
use ac_ffmpeg::codec::{Encoder, video};
use ac_ffmpeg::time::{TimeBase, Timestamp as AvTimestamp};
use bytes::Bytes;

/// Source layout the scaler was built for
type ScalerKey = (u32, u32, PixelFormat);

/// H.264 (or any libavcodec video codec) encoder.
///
/// Frames are converted to the target size and pixel format with swscale
/// before they reach the codec. PTS is a running frame counter in a
/// `1/framerate` time base.
pub struct FfmpegEncoder {
    encoder: Option<VideoEncoder>,
    scaler: Option<(ScalerKey, VideoFrameScaler)>,
    target_format: video::frame::PixelFormat,
    w: usize,
    h: usize,
    time_base: TimeBase,
    frame_count: i64,
    flushed: bool,
    pub codec_name: String,
}

// The libav contexts are only ever touched by the thread owning the stage.
unsafe impl Send for FfmpegEncoder {}

fn unit_error(e: ac_ffmpeg::Error) -> CapabilityError {
    CapabilityError::Unit(anyhow::Error::new(e))
}

/// Row width in bytes and row count of each plane of a tightly packed frame
fn plane_layout(format: PixelFormat, w: usize, h: usize) -> Vec<(usize, usize)> {
    let (cw, ch) = (w.div_ceil(2), h.div_ceil(2));
    match format {
        PixelFormat::Bgra => vec![(w * 4, h)],
        PixelFormat::Nv12 => vec![(w, h), (cw * 2, ch)],
        PixelFormat::Yuv420p => vec![(w, h), (cw, ch), (cw, ch)],
    }
}

impl FfmpegEncoder {
    pub fn new() -> Self {
        Self {
            encoder: None,
            scaler: None,
            target_format: video::frame::get_pixel_format("yuv420p"),
            w: 0,
            h: 0,
            time_base: TimeBase::new(1, 1),
            frame_count: 0,
            flushed: false,
            codec_name: String::new(),
        }
    }

    fn encoder(&mut self) -> Result<&mut VideoEncoder, CapabilityError> {
        self.encoder
            .as_mut()
            .ok_or_else(|| CapabilityError::fatal("encoder used before open"))
    }

    /// Copy a packed frame into a libav frame, honouring the destination line padding
    fn to_av_frame(&self, frame: &RawFrame) -> VideoFrame {
        let (w, h) = (frame.width as usize, frame.height as usize);
        let pixel_format = video::frame::get_pixel_format(frame.format.name());
        let mut av_frame = VideoFrameMut::black(pixel_format, w, h).with_time_base(self.time_base);

        {
            let mut offset = 0;
            let mut planes = av_frame.planes_mut();
            for (index, (row_bytes, rows)) in
                plane_layout(frame.format, w, h).into_iter().enumerate()
            {
                let destination = planes[index].data_mut();
                let line_size = destination.len() / rows.max(1);
                for r in 0..rows {
                    let src = &frame.data[offset + r * row_bytes..offset + (r + 1) * row_bytes];
                    let dst_start = r * line_size;
                    destination[dst_start..dst_start + row_bytes].copy_from_slice(src);
                }
                offset += row_bytes * rows;
            }
        }

        av_frame.freeze()
    }

    fn scale(&mut self, frame: VideoFrame, key: ScalerKey) -> Result<VideoFrame, CapabilityError> {
        let rebuild = match &self.scaler {
            Some((current, _)) => *current != key,
            None => true,
        };
        if rebuild {
            let scaler = VideoFrameScaler::builder()
                .source_pixel_format(frame.pixel_format())
                .source_width(key.0 as usize)
                .source_height(key.1 as usize)
                .target_pixel_format(self.target_format)
                .target_width(self.w)
                .target_height(self.h)
                .algorithm(Algorithm::Bilinear)
                .build()
                .map_err(|e| CapabilityError::Fatal(anyhow::Error::new(e)))?;
            log::debug!(
                "FfmpegEncoder: scaler {}x{} {} -> {}x{}",
                key.0,
                key.1,
                key.2,
                self.w,
                self.h
            );
            self.scaler = Some((key, scaler));
        }

        match &mut self.scaler {
            Some((_, scaler)) => scaler.scale(&frame).map_err(unit_error),
            None => Err(CapabilityError::fatal("scaler unavailable")),
        }
    }
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTransformer for FfmpegEncoder {
    fn open(&mut self, config: &EncoderConfig) -> Result<(), CapabilityError> {
        // 4:2:0 chroma needs even dimensions
        let w = (config.width + config.width % 2) as usize;
        let h = (config.height + config.height % 2) as usize;
        let time_base = TimeBase::new(1, config.framerate.max(1) as i32);
        let target_format = video::frame::get_pixel_format(config.pixel_format.name());

        let mut builder = VideoEncoder::builder(&config.codec).map_err(|e| {
            CapabilityError::fatal(format!("codec '{}' not found: {}", config.codec, e))
        })?;
        builder = builder
            .pixel_format(target_format)
            .width(w)
            .height(h)
            .time_base(time_base)
            .set_option("b", config.bitrate.to_string())
            .set_option("g", config.gop_size.to_string())
            .set_option("bf", config.max_b_frames.to_string());
        if !config.preset.is_empty() {
            builder = builder.set_option("preset", &config.preset);
        }
        if !config.tune.is_empty() {
            builder = builder.set_option("tune", &config.tune);
        }

        let encoder = builder.build().map_err(|e| {
            CapabilityError::fatal(format!("could not open codec '{}': {}", config.codec, e))
        })?;
        log::info!(
            "Using encoder: {} ({}x{} {}, {} bps)",
            config.codec,
            w,
            h,
            config.pixel_format,
            config.bitrate
        );

        self.encoder = Some(encoder);
        self.scaler = None;
        self.target_format = target_format;
        self.w = w;
        self.h = h;
        self.time_base = time_base;
        self.frame_count = 0;
        self.flushed = false;
        self.codec_name = config.codec.clone();
        Ok(())
    }

    fn submit(&mut self, frame: RawFrame) -> Result<(), CapabilityError> {
        if self.flushed {
            return Err(CapabilityError::unit("frame submitted after flush"));
        }
        let key = (frame.width, frame.height, frame.format);
        let av_frame = self.to_av_frame(&frame);
        let scaled = self
            .scale(av_frame, key)?
            .with_pts(AvTimestamp::new(self.frame_count, self.time_base));
        self.frame_count += 1;

        self.encoder()?.push(scaled).map_err(unit_error)
    }

    fn retrieve(&mut self) -> Result<Retrieved, CapabilityError> {
        let flushed = self.flushed;
        let packet = self.encoder()?.take().map_err(unit_error)?;

        match packet {
            Some(packet) => {
                let to_micros = |ts: AvTimestamp| {
                    Timestamp::from_micros(ts.as_micros().unwrap_or_default())
                };
                let pts = to_micros(packet.pts());
                let dts = to_micros(packet.dts());
                Ok(Retrieved::Unit(
                    EncodedPacket::new(Bytes::copy_from_slice(packet.data()), pts, packet.is_key())
                        .with_dts(dts),
                ))
            }
            None if flushed => Ok(Retrieved::Exhausted),
            None => Ok(Retrieved::NeedsInput),
        }
    }

    fn flush(&mut self) -> Result<(), CapabilityError> {
        if self.flushed {
            return Ok(());
        }
        self.encoder()?.flush().map_err(unit_error)?;
        self.flushed = true;
        Ok(())
    }

    fn close(&mut self) {
        self.scaler = None;
        if self.encoder.take().is_some() {
            log::info!(
                "FfmpegEncoder: closed {} after {} frames",
                self.codec_name,
                self.frame_count
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_layout() {
        assert_eq!(plane_layout(PixelFormat::Bgra, 4, 2), vec![(16, 2)]);
        assert_eq!(plane_layout(PixelFormat::Nv12, 4, 2), vec![(4, 2), (4, 1)]);
        assert_eq!(
            plane_layout(PixelFormat::Yuv420p, 3, 3),
            vec![(3, 3), (2, 2), (2, 2)]
        );
    }

    #[test]
    fn test_unknown_codec_is_fatal() {
        let mut encoder = FfmpegEncoder::new();
        let config = EncoderConfig {
            codec: "no-such-codec".to_string(),
            ..Default::default()
        };
        assert!(encoder.open(&config).unwrap_err().is_fatal());
    }
}
