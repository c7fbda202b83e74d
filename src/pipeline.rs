/// Per-frame context lifecycle: MB-row scheduling, reference list
/// management, and display-order reassembly.
use crate::error::Result;
use crate::frame::Frame;
use crate::headers::{PictureHeader, SequenceHeader};
use crate::mb::MbContext;
use rayon::prelude::*;
use std::sync::Arc;

/// A fully reconstructed, loop-filtered, padded picture plus its header,
/// ready for reference use or output.
pub struct DecodedPicture {
    pub frame: Arc<Frame>,
    pub header: PictureHeader,
    pub mb_ctx: Vec<Vec<MbContext>>,
}

/// Runs the loop filter across every MB row of a finished picture. Within
/// a plane, MB rows share pixels across the horizontal edge and stay
/// strictly sequential, but the Y/U/V planes are disjoint allocations
/// (`Frame::planes`) with no cross-plane boundary strength dependency, so
/// the three planes filter concurrently.
pub fn run_loop_filter(frame: &mut Frame, mb_rows: &[Vec<MbContext>], alpha_c_offset: i32, beta_offset: i32, mb_cols: usize) {
    let mb_row_cnt = mb_rows.len();
    let [y_plane, u_plane, v_plane] = frame.planes_mut();
    rayon::join(
        || {
            for my in 0..mb_row_cnt {
                for mx in 0..mb_cols {
                    crate::loopfilter::filter_macroblock_luma(y_plane, mx, my, &mb_rows[my][mx], alpha_c_offset, beta_offset);
                }
            }
        },
        || {
            rayon::join(
                || {
                    for my in 0..mb_row_cnt {
                        for mx in 0..mb_cols {
                            crate::loopfilter::filter_macroblock_chroma(u_plane, mx, my, &mb_rows[my][mx], alpha_c_offset, beta_offset);
                        }
                    }
                },
                || {
                    for my in 0..mb_row_cnt {
                        for mx in 0..mb_cols {
                            crate::loopfilter::filter_macroblock_chroma(v_plane, mx, my, &mb_rows[my][mx], alpha_c_offset, beta_offset);
                        }
                    }
                },
            );
        },
    );
}

/// Pads every plane's edges (8-pel luma, 16-pel chroma border already
/// sized into `Frame::new`) so future motion compensation never reads
/// uninitialised storage. The three planes are independent, so this runs
/// over them with a data-parallel sweep the same way the loop-filter pass
/// would for a wider picture.
pub fn pad_for_reference(frame: &mut Frame) {
    frame.planes_mut().par_iter_mut().for_each(|p| p.extend_padding());
}

/// At most two entries: P pictures keep (most-recent, previous) I/P; B
/// pictures hold (backward, forward) and are themselves never inserted.
pub struct ReferenceList {
    entries: Vec<Arc<DecodedPicture>>,
}

impl ReferenceList {
    pub fn new() -> Self {
        Self { entries: Vec::with_capacity(2) }
    }

    pub fn on_i_picture(&mut self, pic: Arc<DecodedPicture>) {
        self.entries.clear();
        self.entries.push(pic);
    }

    pub fn on_p_picture(&mut self, pic: Arc<DecodedPicture>) {
        if self.entries.len() >= 2 {
            self.entries.remove(0);
        }
        self.entries.push(pic);
    }

    pub fn backward(&self) -> Option<&Arc<DecodedPicture>> {
        self.entries.last()
    }

    pub fn forward(&self) -> Option<&Arc<DecodedPicture>> {
        if self.entries.len() >= 2 {
            self.entries.get(self.entries.len() - 2)
        } else {
            None
        }
    }
}

impl Default for ReferenceList {
    fn default() -> Self {
        Self::new()
    }
}

/// Buffers B pictures until the next I/P picture's distance lets them be
/// flushed in ascending `pic_distance` order, for display-order output.
#[derive(Default)]
pub struct ReorderBuffer {
    pending: Vec<Arc<DecodedPicture>>,
}

impl ReorderBuffer {
    pub fn push(&mut self, pic: Arc<DecodedPicture>) {
        self.pending.push(pic);
    }

    /// Flushes every buffered picture whose distance falls before `until`,
    /// in ascending distance order.
    pub fn flush_before(&mut self, until: u32) -> Vec<Arc<DecodedPicture>> {
        let (mut ready, rest): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| p.header.pic_distance < until);
        ready.sort_by_key(|p| p.header.pic_distance);
        self.pending = rest;
        ready
    }

    pub fn flush_all(&mut self) -> Vec<Arc<DecodedPicture>> {
        let mut ready: Vec<_> = self.pending.drain(..).collect();
        ready.sort_by_key(|p| p.header.pic_distance);
        ready
    }
}

pub struct FramePipeline {
    pub seq: Option<SequenceHeader>,
    pub refs: ReferenceList,
    pub reorder: ReorderBuffer,
    pub low_delay: bool,
}

impl FramePipeline {
    pub fn new() -> Self {
        Self { seq: None, refs: ReferenceList::new(), reorder: ReorderBuffer::default(), low_delay: false }
    }

    pub fn set_sequence(&mut self, seq: SequenceHeader) {
        self.low_delay = seq.low_delay;
        self.seq = Some(seq);
    }

    /// Installs a freshly decoded picture into the reference list (I/P
    /// only) and returns pictures now ready for output in display order.
    pub fn on_picture_decoded(&mut self, pic: DecodedPicture, pic_type: u8) -> Result<Vec<Arc<DecodedPicture>>> {
        let pic = Arc::new(pic);
        let is_b = pic_type == 3;

        if is_b {
            if self.low_delay {
                return Ok(vec![pic]);
            }
            self.reorder.push(pic);
            return Ok(Vec::new());
        }

        if pic_type == 1 {
            self.refs.on_i_picture(pic.clone());
        } else {
            self.refs.on_p_picture(pic.clone());
        }

        if self.low_delay {
            return Ok(vec![pic]);
        }
        let mut out = self.reorder.flush_before(pic.header.pic_distance);
        out.push(pic);
        Ok(out)
    }

    pub fn flush(&mut self) -> Vec<Arc<DecodedPicture>> {
        self.reorder.flush_all()
    }
}

impl Default for FramePipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_pic(distance: u32) -> DecodedPicture {
        DecodedPicture {
            frame: Arc::new(Frame::new(16, 16)),
            header: PictureHeader { pic_distance: distance, ..Default::default() },
            mb_ctx: Vec::new(),
        }
    }

    #[test]
    fn reference_list_keeps_two_most_recent() {
        let mut refs = ReferenceList::new();
        refs.on_i_picture(Arc::new(make_pic(0)));
        refs.on_p_picture(Arc::new(make_pic(1)));
        refs.on_p_picture(Arc::new(make_pic(2)));
        assert_eq!(refs.backward().unwrap().header.pic_distance, 2);
        assert_eq!(refs.forward().unwrap().header.pic_distance, 1);
    }

    #[test]
    fn reorder_buffer_flushes_in_distance_order() {
        let mut buf = ReorderBuffer::default();
        buf.push(Arc::new(make_pic(5)));
        buf.push(Arc::new(make_pic(3)));
        let out = buf.flush_before(10);
        assert_eq!(out[0].header.pic_distance, 3);
        assert_eq!(out[1].header.pic_distance, 5);
    }
}
