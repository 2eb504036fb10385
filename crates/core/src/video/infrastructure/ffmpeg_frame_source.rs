use ffmpeg_next::format::context::Input;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video;

use crate::shared::frame::{Frame, PixelLayout};
use crate::video::domain::frame_source::FrameSource;

/// Decodes frames via ffmpeg-next from a file, a stream URL, or a capture
/// device (`v4l2`, `avfoundation`, `dshow`, ...).
///
/// Every decoded frame is converted to RGB24.
pub struct FfmpegFrameSource {
    ictx: Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: scaling::Context,
    width: u32,
    height: u32,
    video_stream_index: usize,
    frame_index: usize,
    flushing: bool,
    done: bool,
}

impl FfmpegFrameSource {
    /// Opens `input`. With `format` set, `input` names a device of that
    /// capture backend (e.g. `/dev/video0` with `v4l2`).
    pub fn open(input: &str, format: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let ictx = match format {
            Some(name) => open_device(input, name)?,
            None => ffmpeg_next::format::input(input)?,
        };

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;
        let video_stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let width = decoder.width();
        let height = decoder.height();
        let scaler = scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            scaling::Flags::BILINEAR,
        )?;

        log::info!(
            "Opened {input} ({width}x{height}, {})",
            decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_else(|| "unknown codec".to_string())
        );

        Ok(Self {
            ictx,
            decoder,
            scaler,
            width,
            height,
            video_stream_index,
            frame_index: 0,
            flushing: false,
            done: false,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn try_receive(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let mut decoded = Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }
        let mut rgb_frame = Video::empty();
        self.scaler.run(&decoded, &mut rgb_frame)?;

        let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
        let frame = Frame::new(
            pixels,
            self.width,
            self.height,
            PixelLayout::Rgb,
            self.frame_index,
        );
        self.frame_index += 1;
        Ok(Some(frame))
    }
}

impl FrameSource for FfmpegFrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        if self.done {
            return Ok(None);
        }

        if let Some(frame) = self.try_receive()? {
            return Ok(Some(frame));
        }

        if self.flushing {
            self.done = true;
            return Ok(None);
        }

        loop {
            let Some((stream, packet)) = self.ictx.packets().next() else {
                let _ = self.decoder.send_eof();
                self.flushing = true;
                if let Some(frame) = self.try_receive()? {
                    return Ok(Some(frame));
                }
                self.done = true;
                return Ok(None);
            };

            if stream.index() != self.video_stream_index {
                continue;
            }

            if let Err(e) = self.decoder.send_packet(&packet) {
                log::debug!("Dropping undecodable packet: {e}");
                continue;
            }

            if let Some(frame) = self.try_receive()? {
                return Ok(Some(frame));
            }
        }
    }
}

fn open_device(input: &str, format_name: &str) -> Result<Input, Box<dyn std::error::Error>> {
    ffmpeg_next::device::register_all();
    let format = ffmpeg_next::device::input::video()
        .find(|f| f.name() == format_name)
        .ok_or_else(|| format!("Unknown capture format: {format_name}"))?;
    match ffmpeg_next::format::open_with(input, &format, ffmpeg_next::Dictionary::new())? {
        ffmpeg_next::format::context::Context::Input(ictx) => Ok(ictx),
        ffmpeg_next::format::context::Context::Output(_) => {
            Err(format!("{input} did not open as an input").into())
        }
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer,
/// stripping any per-row stride padding.
fn extract_rgb_pixels(rgb_frame: &Video, width: u32, height: u32) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_len = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for row in 0..height as usize {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + row_len]);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn create_test_video(path: &Path, num_frames: usize, width: u32, height: u32, fps: i32) {
        ffmpeg_next::init().unwrap();

        let mut octx = ffmpeg_next::format::output(path).unwrap();
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4).unwrap();
        let mut ost = octx.add_stream(Some(codec)).unwrap();

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .unwrap();
        encoder_ctx.set_width(width);
        encoder_ctx.set_height(height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(ffmpeg_next::Rational(1, fps));
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps, 1)));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let mut encoder = encoder_ctx
            .open_with(ffmpeg_next::Dictionary::new())
            .unwrap();
        ost.set_parameters(&encoder);
        octx.write_header().unwrap();
        let ost_time_base = octx.stream(0).unwrap().time_base();

        let mut scaler = scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::format::Pixel::YUV420P,
            width,
            height,
            scaling::Flags::BILINEAR,
        )
        .unwrap();

        let drain = |encoder: &mut ffmpeg_next::encoder::Video,
                         octx: &mut ffmpeg_next::format::context::Output| {
            let mut encoded = ffmpeg_next::Packet::empty();
            while encoder.receive_packet(&mut encoded).is_ok() {
                encoded.set_stream(0);
                encoded.rescale_ts(ffmpeg_next::Rational(1, fps), ost_time_base);
                encoded.write_interleaved(octx).unwrap();
            }
        };

        for i in 0..num_frames {
            let mut rgb = Video::new(ffmpeg_next::format::Pixel::RGB24, width, height);
            let stride = rgb.stride(0);
            let value = ((i * 40) % 256) as u8;
            let data = rgb.data_mut(0);
            for row in 0..height as usize {
                data[row * stride..row * stride + width as usize * 3].fill(value);
            }

            let mut yuv = Video::empty();
            scaler.run(&rgb, &mut yuv).unwrap();
            yuv.set_pts(Some(i as i64));
            encoder.send_frame(&yuv).unwrap();
            drain(&mut encoder, &mut octx);
        }

        encoder.send_eof().unwrap();
        drain(&mut encoder, &mut octx);
        octx.write_trailer().unwrap();
    }

    #[test]
    fn test_reads_all_frames_then_ends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.mp4");
        create_test_video(&path, 5, 160, 120, 30);

        let mut source = FfmpegFrameSource::open(path.to_str().unwrap(), None).unwrap();
        assert_eq!((source.width(), source.height()), (160, 120));

        let mut frames = Vec::new();
        while let Some(frame) = source.next_frame().unwrap() {
            frames.push(frame);
        }
        assert_eq!(frames.len(), 5);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.index(), i);
            assert_eq!(frame.layout(), PixelLayout::Rgb);
            assert_eq!(frame.data().len(), 160 * 120 * 3);
        }

        // Stays exhausted.
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_open_nonexistent_fails() {
        assert!(FfmpegFrameSource::open("/nonexistent/test.mp4", None).is_err());
    }

    #[test]
    fn test_unknown_capture_format_fails() {
        let err = FfmpegFrameSource::open("/dev/video0", Some("no-such-backend"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("no-such-backend"));
    }
}
