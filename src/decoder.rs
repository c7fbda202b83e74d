/// Public decoder facade: feed coded pictures, receive decoded pictures
/// through a notifier callback, matching `IrkAvsDecoder.h`'s shape
/// translated into owned Rust values instead of an opaque handle plus a
/// C-ABI callback pointer.
use crate::error::{Error, Result};
use crate::headers::{parse_picture_header_i, parse_picture_header_pb, parse_sequence_header, SequenceHeader};
use crate::pipeline::{pad_for_reference, run_loop_filter, DecodedPicture, FramePipeline};
use std::sync::Arc;
use tracing::{debug, info_span};

#[derive(Clone, Copy, Debug, Default)]
pub struct DecoderConfig {
    pub output_encoded_order: bool,
    pub thread_cnt: usize,
    pub disable_loop_filter: bool,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct StreamInfo {
    pub profile: u8,
    pub level: u8,
    pub width: u16,
    pub height: u16,
    pub chroma_format: u8,
    pub progressive_seq: bool,
}

/// Splits a byte-stream into start-code-delimited units (`00 00 01 xx`),
/// each handed whole to the header parser or slice decoder.
fn find_start_codes(data: &[u8]) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut i = 0usize;
    while i + 3 < data.len() {
        if data[i] == 0 && data[i + 1] == 0 && data[i + 2] == 1 {
            starts.push(i);
            i += 3;
        } else {
            i += 1;
        }
    }
    starts
}

pub struct Decoder {
    config: DecoderConfig,
    pipeline: FramePipeline,
    info: Option<StreamInfo>,
}

impl Decoder {
    pub fn create(config: DecoderConfig) -> Self {
        Self { config, pipeline: FramePipeline::new(), info: None }
    }

    pub fn get_info(&self) -> Option<StreamInfo> {
        self.info
    }

    /// Feeds one coded unit (a full elementary-stream buffer containing at
    /// least one start code) and returns every picture now ready for
    /// output, in display order (unless the stream or config forces
    /// encoded order).
    pub fn feed(&mut self, data: &[u8]) -> Result<Vec<Arc<DecodedPicture>>> {
        let starts = find_start_codes(data);
        if starts.is_empty() {
            return Err(Error::bad_stream("no start code found in coded unit"));
        }

        let mut out = Vec::new();
        for (k, &start) in starts.iter().enumerate() {
            let end = starts.get(k + 1).copied().unwrap_or(data.len());
            let unit = &data[start..end];
            if unit.len() < 4 {
                continue;
            }
            let start_code = unit[3];
            let span = info_span!("coded_unit", start_code);
            let _guard = span.enter();

            match start_code {
                0xB0 => {
                    let seq = parse_sequence_header(unit)?;
                    debug!(width = seq.width, height = seq.height, profile = seq.profile, "sequence header parsed");
                    self.info = Some(StreamInfo {
                        profile: seq.profile,
                        level: seq.level,
                        width: seq.width,
                        height: seq.height,
                        chroma_format: seq.chroma_format,
                        progressive_seq: seq.progressive_seq,
                    });
                    self.pipeline.set_sequence(seq);
                }
                0xB3 | 0xB6 => {
                    let seq = self.info_as_seq_header()?;
                    let hdr = if start_code == 0xB3 {
                        parse_picture_header_i(unit, &seq)?
                    } else {
                        parse_picture_header_pb(unit, &seq)?
                    };
                    let pic_type = hdr.pic_type;
                    let decoded = self.decode_picture_body(&seq, hdr, unit)?;
                    let ready = self.pipeline.on_picture_decoded(decoded, pic_type)?;
                    out.extend(ready);
                }
                _ => {}
            }
        }
        Ok(out)
    }

    fn info_as_seq_header(&self) -> Result<SequenceHeader> {
        self.pipeline.seq.clone().ok_or_else(|| Error::bad_stream("picture header before sequence header"))
    }

    /// Drives the slice-level MB decode and loop filter for one picture: the
    /// per-MB syntax decode lives in `mb`/`slice`, reference and reorder
    /// bookkeeping in `pipeline`; this stitches them into one reconstructed,
    /// padded picture.
    fn decode_picture_body(
        &mut self,
        seq: &SequenceHeader,
        hdr: crate::headers::PictureHeader,
        unit: &[u8],
    ) -> Result<DecodedPicture> {
        let span = info_span!("picture", pic_type = hdr.pic_type, pic_distance = hdr.pic_distance, qp = hdr.pic_qp);
        let _guard = span.enter();

        let mut frame = crate::frame::Frame::new(seq.width as usize, seq.height as usize);
        let mb_cols = (seq.width as usize).div_ceil(16);
        let mb_rows = (seq.height as usize).div_ceil(16);

        let is_intra = hdr.pic_type == crate::enums::PicType::I as u8;
        let is_b = hdr.pic_type == crate::enums::PicType::B as u8;
        let (ref_frame, ref_dist) = if is_intra {
            (None, 1)
        } else {
            let backward = self.pipeline.refs.backward();
            let dist = backward
                .map(|p| (hdr.pic_distance as i32 - p.header.pic_distance as i32).max(1))
                .unwrap_or(1);
            (backward.map(|p| p.frame.as_ref()), dist)
        };

        // Forward reference + its stored per-MB motion, used only for B
        // pictures' bi-prediction and direct/skip mode; the forward
        // reference is a future picture already decoded ahead of display
        // order, so its distance is taken relative to the current picture.
        let (fwd_frame, fwd_mb_ctx, ref_dist_fwd) = if is_b {
            let forward = self.pipeline.refs.forward();
            let dist = forward
                .map(|p| (p.header.pic_distance as i32 - hdr.pic_distance as i32).max(1))
                .unwrap_or(1);
            (forward.map(|p| p.frame.as_ref()), forward.map(|p| &p.mb_ctx), dist)
        } else {
            (None, None, 1)
        };

        let mb_ctx_rows = crate::slice::decode_slices(
            unit,
            &hdr,
            &mut frame,
            ref_frame,
            fwd_frame,
            fwd_mb_ctx,
            mb_cols,
            mb_rows,
            ref_dist,
            ref_dist_fwd,
        )?;

        if !hdr.loop_filter_disable && !self.config.disable_loop_filter {
            run_loop_filter(&mut frame, &mb_ctx_rows, hdr.alpha_c_offset, hdr.beta_offset, mb_cols);
        }
        pad_for_reference(&mut frame);

        Ok(DecodedPicture { frame: Arc::new(frame), header: hdr, mb_ctx: mb_ctx_rows })
    }

    /// Signals end of stream: every buffered B picture is released in
    /// display order.
    pub fn flush(&mut self) -> Vec<Arc<DecodedPicture>> {
        self.pipeline.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_start_codes_locates_all_units() {
        let data = [0, 0, 1, 0xB0, 1, 2, 0, 0, 1, 0xB3, 3, 4];
        let starts = find_start_codes(&data);
        assert_eq!(starts, vec![0, 6]);
    }

    #[test]
    fn feed_rejects_buffer_without_start_code() {
        let mut dec = Decoder::create(DecoderConfig::default());
        assert!(dec.feed(&[1, 2, 3, 4]).is_err());
    }

    #[test]
    fn feed_rejects_picture_header_before_sequence_header() {
        let mut dec = Decoder::create(DecoderConfig::default());
        let data = [0, 0, 1, 0xB3, 0, 0, 0, 0, 0, 0, 0, 0];
        assert!(dec.feed(&data).is_err());
    }
}
