/// Per-macroblock decode: intra-mode parsing, CBP, qp_delta, coefficient
/// blocks, prediction and reconstruction for I-MBs; shared plumbing for
/// the P/B variants (`src/inter.rs` supplies the motion side).
use crate::aec::AecReader;
use crate::bitreader::BitReader;
use crate::consts::{CHROMA_QP, DEQUANT_SCALE, DEQUANT_SHIFT};
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::idct::idct_8x8_add;
use crate::inter::Mv;
use crate::intra::{get_intra_pred_mode, BlockView, ChromaIntraMode, LumaIntraMode, NbUsable};
use crate::vlc::VlcFamily;

/// Standard table 42: `(cbp_flags, next_table_index)` keyed by `cbp_idx`.
const CBP_TAB: [(u8, u8); 64] = [
    (63, 0), (15, 15), (31, 63), (47, 31), (0, 16), (14, 32), (13, 47), (11, 13),
    (7, 14), (5, 11), (10, 12), (8, 5), (12, 10), (61, 7), (4, 48), (55, 3),
    (1, 2), (2, 8), (59, 4), (3, 1), (62, 61), (9, 55), (6, 59), (29, 62),
    (45, 29), (51, 27), (23, 23), (39, 19), (27, 30), (46, 28), (53, 9), (30, 6),
    (43, 60), (37, 21), (60, 44), (16, 26), (21, 51), (28, 35), (19, 18), (35, 20),
    (42, 24), (26, 53), (44, 17), (32, 37), (58, 39), (24, 45), (20, 58), (17, 43),
    (18, 42), (48, 46), (22, 36), (33, 33), (25, 34), (49, 40), (40, 52), (36, 49),
    (34, 50), (50, 56), (52, 25), (54, 22), (41, 54), (56, 57), (38, 41), (57, 38),
];

fn luma_mode_from_index(i: i8) -> LumaIntraMode {
    match i {
        0 => LumaIntraMode::Vertical,
        1 => LumaIntraMode::Horizontal,
        2 => LumaIntraMode::Dc,
        3 => LumaIntraMode::DownLeft,
        _ => LumaIntraMode::DownRight,
    }
}

fn chroma_mode_from_index(i: u32) -> Result<ChromaIntraMode> {
    Ok(match i {
        0 => ChromaIntraMode::Dc,
        1 => ChromaIntraMode::Horizontal,
        2 => ChromaIntraMode::Vertical,
        3 => ChromaIntraMode::Plane,
        _ => return Err(Error::bad_stream("chroma intra mode out of range")),
    })
}

/// Per-MB neighbour bookkeeping, one slot per column ("above") plus one
/// "left" slot, mirroring the original's `MbContext` row lifecycle.
#[derive(Clone, Copy, Debug, Default)]
pub struct MbContext {
    pub avail: bool,
    pub ip_mode: [i8; 2],
    pub left_qp: u8,
    pub top_qp: u8,
    pub cur_qp: u8,
    pub lf_bs: u16,
    pub is_intra: bool,
    pub cbp_nonzero: bool,
    pub cbp: u8,
    pub ref_idx: i32,
    pub mv: crate::inter::Mv,
}

pub enum CoeffReader<'a, 'b> {
    Vlc(&'a mut BitReader<'b>),
    Aec(&'a mut AecReader<'b>),
}

fn dec_coeff_block(
    reader: &mut CoeffReader,
    family: VlcFamily,
    ctx_base: usize,
    scale: i32,
    shift: u8,
    inv_scan: &[u8; 64],
    weight_qm: &[u8; 64],
    coeff: &mut [i16; 64],
) -> Result<bool> {
    match reader {
        CoeffReader::Vlc(bits) => crate::vlc::dec_coeff_block(bits, family, scale, shift, inv_scan, weight_qm, coeff),
        CoeffReader::Aec(aec) => aec.dec_coeff_block(coeff, ctx_base, scale, shift, inv_scan, weight_qm),
    }
}

fn add_residual(plane: &mut crate::frame::Plane, x0: i32, y0: i32, pred: [[u8; 8]; 8], coeff: &[i16; 64], nonzero: bool) {
    if !nonzero {
        for i in 0..8 {
            for j in 0..8 {
                plane.set(x0 + j, y0 + i, pred[i as usize][j as usize]);
            }
        }
        return;
    }
    let coeff32: [i32; 64] = std::array::from_fn(|k| coeff[k] as i32);
    let out = idct_8x8_add(&coeff32, &pred);
    for i in 0..8 {
        for j in 0..8 {
            plane.set(x0 + j, y0 + i, out[i as usize][j as usize]);
        }
    }
}

fn block_view<'a>(plane: &'a mut crate::frame::Plane, x0: i32, y0: i32) -> BlockView<'a> {
    let stride = plane.stride;
    let origin = ((y0 + plane.pad as i32) as usize) * stride + (x0 + plane.pad as i32) as usize;
    BlockView { buf: &mut plane.data, stride, origin }
}

fn capture_pred(plane: &crate::frame::Plane, x0: i32, y0: i32) -> [[u8; 8]; 8] {
    std::array::from_fn(|i| std::array::from_fn(|j| plane.get(x0 + j as i32, y0 + i as i32)))
}

/// Decodes one intra macroblock at 16x16-aligned `(mx, my)` (in macroblock
/// units), reading the shared luma/chroma coefficient streams via
/// `reader`/`family` and writing reconstructed samples into `frame`.
#[allow(clippy::too_many_arguments)]
pub fn dec_macroblock_i8x8(
    reader: &mut CoeffReader,
    left_mb: &mut MbContext,
    top_mb: &mut MbContext,
    cur_mb: &mut MbContext,
    frame: &mut Frame,
    mx: usize,
    my: usize,
    cur_qp: &mut u8,
    fixed_qp: bool,
    lf_disabled: bool,
    is_b_picture: bool,
    mb_type_idx: i32,
    chroma_delta_cb: i32,
    chroma_delta_cr: i32,
    family: VlcFamily,
    inv_scan: &[u8; 64],
    weight_qm: &[u8; 64],
) -> Result<()> {
    let mut luma_pred = [0i8; 4];

    let pred_ab = get_intra_pred_mode(left_mb.ip_mode[0] as i32, top_mb.ip_mode[0] as i32);
    luma_pred[0] = pred_ab;
    let pred_ab = get_intra_pred_mode(luma_pred[0] as i32, top_mb.ip_mode[1] as i32);
    luma_pred[1] = pred_ab;
    let pred_ab = get_intra_pred_mode(left_mb.ip_mode[1] as i32, luma_pred[0] as i32);
    luma_pred[2] = pred_ab;
    let pred_ab = get_intra_pred_mode(luma_pred[2] as i32, luma_pred[1] as i32);
    luma_pred[3] = pred_ab;

    let chroma_pred_idx = match reader {
        CoeffReader::Vlc(bits) => bits.read_ue8()?,
        CoeffReader::Aec(aec) => aec.dec_intra_chroma_pred_mode(0)?,
    };
    let chroma_pred = chroma_mode_from_index(chroma_pred_idx)?;

    let cbp_flags = match reader {
        CoeffReader::Vlc(bits) => {
            let cbp_idx = if is_b_picture {
                if mb_type_idx < 24 { bits.read_ue8()? as i32 } else { mb_type_idx - 24 }
            } else if mb_type_idx < 5 {
                bits.read_ue8()? as i32
            } else {
                mb_type_idx - 5
            };
            if !(0..64).contains(&cbp_idx) {
                return Err(Error::bad_stream("cbp index out of range"));
            }
            CBP_TAB[cbp_idx as usize].0
        }
        CoeffReader::Aec(aec) => {
            let left_cbp = if left_mb.avail { left_mb.cbp } else { 0 };
            let top_cbp = if top_mb.avail { top_mb.cbp } else { 0 };
            aec.dec_cbp(left_cbp, top_cbp)?
        }
    };

    if cbp_flags != 0 && !fixed_qp {
        let delta = match reader {
            CoeffReader::Vlc(bits) => bits.read_se8()?,
            CoeffReader::Aec(aec) => aec.dec_qp_delta()?,
        };
        let qp = *cur_qp as i32 + delta;
        if !(0..64).contains(&qp) {
            return Err(Error::bad_stream("qp_delta pushes qp out of range"));
        }
        *cur_qp = qp as u8;
    }

    let scale = DEQUANT_SCALE[*cur_qp as usize];
    let shift = DEQUANT_SHIFT[*cur_qp as usize];

    let x0 = (mx * 16) as i32;
    let y0 = (my * 16) as i32;
    let mut coeff = [0i16; 64];

    let luma_origins = [(x0, y0), (x0 + 8, y0), (x0, y0 + 8), (x0 + 8, y0 + 8)];
    let luma_usable = [
        NbUsable { top: top_mb.avail, top_right: top_mb.avail, left: left_mb.avail, bottom_left: left_mb.avail },
        NbUsable { top: top_mb.avail, top_right: true, left: true, bottom_left: false },
        NbUsable { top: true, top_right: true, left: left_mb.avail, bottom_left: false },
        NbUsable { top: true, top_right: false, left: true, bottom_left: false },
    ];

    for k in 0..4 {
        let (bx, by) = luma_origins[k];
        {
            let mut view = block_view(frame.y_mut(), bx, by);
            view.predict_luma(luma_mode_from_index(luma_pred[k]), luma_usable[k]);
        }
        let nonzero = cbp_flags & (1 << k) != 0;
        if nonzero {
            dec_coeff_block(reader, family, 0, scale, shift, inv_scan, weight_qm, &mut coeff)?;
        }
        let pred = capture_pred(frame.y(), bx, by);
        add_residual(frame.y_mut(), bx, by, pred, &coeff, nonzero);
    }

    let cx0 = (mx * 8) as i32;
    let cy0 = (my * 8) as i32;
    let chroma_usable = NbUsable { top: top_mb.avail, top_right: top_mb.avail, left: left_mb.avail, bottom_left: false };

    for (plane_idx, delta) in [(1usize, chroma_delta_cb), (2usize, chroma_delta_cr)] {
        {
            let plane = frame.plane_mut(plane_idx);
            let mut view = block_view(plane, cx0, cy0);
            view.predict_chroma(chroma_pred, chroma_usable);
        }
        let bit = if plane_idx == 1 { 0x10 } else { 0x20 };
        let nonzero = cbp_flags & bit != 0;
        if nonzero {
            let qp = *cur_qp as i32 + delta;
            if !(0..64).contains(&qp) {
                return Err(Error::bad_stream("chroma qp out of range"));
            }
            let cqp = CHROMA_QP[qp as usize] as usize;
            dec_coeff_block(
                reader,
                VlcFamily::Chroma,
                2,
                DEQUANT_SCALE[cqp],
                DEQUANT_SHIFT[cqp],
                inv_scan,
                weight_qm,
                &mut coeff,
            )?;
        }
        let plane = frame.plane_mut(plane_idx);
        let pred = capture_pred(plane, cx0, cy0);
        add_residual(plane, cx0, cy0, pred, &coeff, nonzero);
    }

    left_mb.avail = true;
    left_mb.ip_mode = [luma_pred[1], luma_pred[3]];
    left_mb.is_intra = true;
    left_mb.cbp = cbp_flags;
    cur_mb.avail = true;
    cur_mb.ip_mode = [luma_pred[2], luma_pred[3]];
    cur_mb.is_intra = true;
    cur_mb.cbp = cbp_flags;

    if !lf_disabled {
        cur_mb.left_qp = left_mb.cur_qp;
        cur_mb.top_qp = top_mb.cur_qp;
        cur_mb.cur_qp = *cur_qp;
        cur_mb.lf_bs = crate::loopfilter::INTRA_BS_SENTINEL;
        left_mb.cur_qp = *cur_qp;
    }

    Ok(())
}

/// Decodes one inter macroblock at 16x16-aligned `(mx, my)`: 16x16-partition
/// motion compensation from `ref_frame` (the backward/list-0 reference),
/// residual coefficients in the same coded order as the intra path. `skip`
/// bypasses MVD/CBP parsing and copies the predicted samples through
/// untouched, matching P_Skip/B_Skip. For B pictures, `fwd_frame`/`col_mv`
/// enable colocated-MV bi-prediction on skip/direct MBs (`inter::direct_mv`)
/// and a single-direction forward/backward choice on coded MBs; only the
/// 16x16 partition is modelled (see DESIGN.md).
#[allow(clippy::too_many_arguments)]
pub fn dec_macroblock_inter(
    reader: &mut CoeffReader,
    left_mb: &mut MbContext,
    top_mb: &mut MbContext,
    top_right_mb: &MbContext,
    cur_mb: &mut MbContext,
    frame: &mut Frame,
    ref_frame: &Frame,
    fwd_frame: Option<&Frame>,
    is_b: bool,
    col_mv: Option<Mv>,
    ref_dist_fwd: i32,
    mvd_abs_ctx: &mut [i32; 2],
    mx: usize,
    my: usize,
    cur_qp: &mut u8,
    fixed_qp: bool,
    lf_disabled: bool,
    skip: bool,
    ref_dist: i32,
    family: VlcFamily,
    inv_scan: &[u8; 64],
    weight_qm: &[u8; 64],
) -> Result<()> {
    use crate::inter::{direct_mv, get_mv_pred, mc_chroma_block, mc_luma_block, MvInfo};

    let neighbour = |mb: &MbContext| MvInfo { ref_idx: if mb.avail { mb.ref_idx } else { -1 }, mv: mb.mv, den_dist: 1 };
    let abc = [neighbour(left_mb), neighbour(top_mb), neighbour(top_right_mb)];
    let mvp = get_mv_pred(&abc, ref_dist);

    let mut bi_mvs: Option<(Mv, Mv)> = None;
    let mut use_fwd_ref = false;

    let (mv, cbp_flags) = if skip {
        if is_b {
            if let (Some(_), Some(col)) = (fwd_frame, col_mv) {
                let (fwd_mv, bwd_mv) = direct_mv(col, 1, 1, ref_dist_fwd, ref_dist);
                bi_mvs = Some((fwd_mv, bwd_mv));
                (bwd_mv, 0u8)
            } else {
                (mvp, 0u8)
            }
        } else {
            (mvp, 0u8)
        }
    } else {
        let (mvd_x, mvd_y) = match reader {
            CoeffReader::Vlc(bits) => (bits.read_se8()?, bits.read_se8()?),
            CoeffReader::Aec(aec) => {
                let mvd = aec.dec_mvd(mvd_abs_ctx)?;
                (mvd[0], mvd[1])
            }
        };
        let mv = Mv { x: (mvp.x as i32 + mvd_x) as i16, y: (mvp.y as i32 + mvd_y) as i16 };

        if is_b && fwd_frame.is_some() {
            use_fwd_ref = match reader {
                CoeffReader::Vlc(bits) => bits.read_bits(1)? != 0,
                CoeffReader::Aec(aec) => aec.dec_ref_idx_b(0)? != 0,
            };
        }

        let cbp_flags = match reader {
            CoeffReader::Vlc(bits) => {
                let cbp_idx = bits.read_ue8()? as i32;
                if !(0..64).contains(&cbp_idx) {
                    return Err(Error::bad_stream("cbp index out of range"));
                }
                CBP_TAB[cbp_idx as usize].0
            }
            CoeffReader::Aec(aec) => {
                let left_cbp = if left_mb.avail { left_mb.cbp } else { 0 };
                let top_cbp = if top_mb.avail { top_mb.cbp } else { 0 };
                aec.dec_cbp(left_cbp, top_cbp)?
            }
        };

        if cbp_flags != 0 && !fixed_qp {
            let delta = match reader {
                CoeffReader::Vlc(bits) => bits.read_se8()?,
                CoeffReader::Aec(aec) => aec.dec_qp_delta()?,
            };
            let qp = *cur_qp as i32 + delta;
            if !(0..64).contains(&qp) {
                return Err(Error::bad_stream("qp_delta pushes qp out of range"));
            }
            *cur_qp = qp as u8;
        }
        (mv, cbp_flags)
    };

    let scale = DEQUANT_SCALE[*cur_qp as usize];
    let shift = DEQUANT_SHIFT[*cur_qp as usize];

    let x0 = (mx * 16) as i32;
    let y0 = (my * 16) as i32;
    let mut luma_pred = [0u8; 16 * 16];
    if let Some((fwd_mv, bwd_mv)) = bi_mvs {
        let mut fwd_pred = [0u8; 16 * 16];
        mc_luma_block(fwd_frame.expect("bi_mvs only set when fwd_frame is Some").y(), x0, y0, fwd_mv, &mut fwd_pred, 16, 16, 16);
        mc_luma_block(ref_frame.y(), x0, y0, bwd_mv, &mut luma_pred, 16, 16, 16);
        for (d, s) in luma_pred.iter_mut().zip(fwd_pred.iter()) {
            *d = ((*d as u32 + *s as u32 + 1) >> 1) as u8;
        }
    } else if use_fwd_ref {
        mc_luma_block(fwd_frame.expect("use_fwd_ref only set when fwd_frame is Some").y(), x0, y0, mv, &mut luma_pred, 16, 16, 16);
    } else {
        mc_luma_block(ref_frame.y(), x0, y0, mv, &mut luma_pred, 16, 16, 16);
    }

    let mut coeff = [0i16; 64];
    let luma_origins = [(x0, y0), (x0 + 8, y0), (x0, y0 + 8), (x0 + 8, y0 + 8)];
    for (k, &(bx, by)) in luma_origins.iter().enumerate() {
        let mut pred = [[0u8; 8]; 8];
        for (i, row) in pred.iter_mut().enumerate() {
            for (j, s) in row.iter_mut().enumerate() {
                let lx = (bx - x0) as usize + j;
                let ly = (by - y0) as usize + i;
                *s = luma_pred[ly * 16 + lx];
            }
        }
        let nonzero = cbp_flags & (1 << k) != 0;
        if nonzero {
            dec_coeff_block(reader, family, 1, scale, shift, inv_scan, weight_qm, &mut coeff)?;
        }
        add_residual(frame.y_mut(), bx, by, pred, &coeff, nonzero);
    }

    let cx0 = (mx * 8) as i32;
    let cy0 = (my * 8) as i32;
    for (plane_idx, bit) in [(1usize, 0x10u8), (2usize, 0x20u8)] {
        let mut pred8 = [0u8; 8 * 8];
        if let Some((fwd_mv, bwd_mv)) = bi_mvs {
            let mut fwd_pred8 = [0u8; 8 * 8];
            mc_chroma_block(fwd_frame.expect("bi_mvs only set when fwd_frame is Some").plane(plane_idx), cx0, cy0, fwd_mv, &mut fwd_pred8, 8, 8, 8);
            mc_chroma_block(ref_frame.plane(plane_idx), cx0, cy0, bwd_mv, &mut pred8, 8, 8, 8);
            for (d, s) in pred8.iter_mut().zip(fwd_pred8.iter()) {
                *d = ((*d as u32 + *s as u32 + 1) >> 1) as u8;
            }
        } else if use_fwd_ref {
            mc_chroma_block(fwd_frame.expect("use_fwd_ref only set when fwd_frame is Some").plane(plane_idx), cx0, cy0, mv, &mut pred8, 8, 8, 8);
        } else {
            mc_chroma_block(ref_frame.plane(plane_idx), cx0, cy0, mv, &mut pred8, 8, 8, 8);
        }
        let mut pred = [[0u8; 8]; 8];
        for (i, row) in pred.iter_mut().enumerate() {
            row.copy_from_slice(&pred8[i * 8..i * 8 + 8]);
        }
        let nonzero = cbp_flags & bit != 0;
        if nonzero {
            dec_coeff_block(reader, VlcFamily::Chroma, 2, scale, shift, inv_scan, weight_qm, &mut coeff)?;
        }
        add_residual(frame.plane_mut(plane_idx), cx0, cy0, pred, &coeff, nonzero);
    }

    let left_bs = if !lf_disabled {
        crate::loopfilter::edge_bs(
            false,
            left_mb.is_intra,
            cbp_flags != 0,
            left_mb.cbp_nonzero,
            0,
            if left_mb.avail { left_mb.ref_idx } else { -1 },
            (mv.x as i32, mv.y as i32),
            (left_mb.mv.x as i32, left_mb.mv.y as i32),
        )
    } else {
        crate::loopfilter::BoundaryStrength::None
    };
    let top_bs = if !lf_disabled {
        crate::loopfilter::edge_bs(
            false,
            top_mb.is_intra,
            cbp_flags != 0,
            top_mb.cbp_nonzero,
            0,
            if top_mb.avail { top_mb.ref_idx } else { -1 },
            (mv.x as i32, mv.y as i32),
            (top_mb.mv.x as i32, top_mb.mv.y as i32),
        )
    } else {
        crate::loopfilter::BoundaryStrength::None
    };

    left_mb.avail = true;
    left_mb.is_intra = false;
    left_mb.ref_idx = 0;
    left_mb.mv = mv;
    left_mb.cbp_nonzero = cbp_flags != 0;
    left_mb.cbp = cbp_flags;
    left_mb.ip_mode = [-1, -1];

    cur_mb.avail = true;
    cur_mb.is_intra = false;
    cur_mb.ref_idx = 0;
    cur_mb.mv = mv;
    cur_mb.cbp_nonzero = cbp_flags != 0;
    cur_mb.cbp = cbp_flags;
    cur_mb.ip_mode = [-1, -1];

    if !lf_disabled {
        cur_mb.left_qp = left_mb.cur_qp;
        cur_mb.top_qp = top_mb.cur_qp;
        cur_mb.cur_qp = *cur_qp;
        left_mb.cur_qp = *cur_qp;
        let internal_bs = if cbp_flags != 0 { crate::loopfilter::BoundaryStrength::Weak } else { crate::loopfilter::BoundaryStrength::None };
        cur_mb.lf_bs = crate::loopfilter::pack_bs([left_bs, internal_bs, internal_bs, internal_bs, top_bs, internal_bs, internal_bs, internal_bs]);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cbp_table_first_and_last_rows_match_reference() {
        assert_eq!(CBP_TAB[0], (63, 0));
        assert_eq!(CBP_TAB[63], (57, 38));
    }

    #[test]
    fn chroma_mode_rejects_out_of_range() {
        assert!(chroma_mode_from_index(4).is_err());
        assert!(chroma_mode_from_index(3).is_ok());
    }
}
