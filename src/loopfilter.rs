/// In-loop deblocking: per-edge boundary strength plus the 4/8-tap sample
/// filters the standard's §9.5 describes.
use crate::consts::CHROMA_QP;
use crate::frame::Plane;
use crate::mb::MbContext;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundaryStrength {
    None = 0,
    Weak = 1,
    Strong = 2,
}

/// Per-edge BS rule (plain scalar form, not the original's SIMD-masked
/// `calc_BS_B8x8`): intra wins outright, then nonzero CBP, then
/// reference/motion mismatch, in that priority order.
pub fn edge_bs(
    side_a_intra: bool,
    side_b_intra: bool,
    side_a_cbp_nonzero: bool,
    side_b_cbp_nonzero: bool,
    ref_a: i32,
    ref_b: i32,
    mv_a: (i32, i32),
    mv_b: (i32, i32),
) -> BoundaryStrength {
    if side_a_intra || side_b_intra {
        return BoundaryStrength::Strong;
    }
    if side_a_cbp_nonzero || side_b_cbp_nonzero {
        return BoundaryStrength::Weak;
    }
    if ref_a != ref_b || (mv_a.0 - mv_b.0).abs() >= 4 || (mv_a.1 - mv_b.1).abs() >= 4 {
        return BoundaryStrength::Weak;
    }
    BoundaryStrength::None
}

/// Packs eight 2-bit edge strengths (4 vertical, 4 horizontal) the way
/// `MbContext::lf_bs` stores them; intra MBs use the all-strong sentinel
/// the original sets unconditionally (`0xAAAA`).
pub fn pack_bs(edges: [BoundaryStrength; 8]) -> u16 {
    let mut bs = 0u16;
    for (i, e) in edges.iter().enumerate() {
        bs |= (*e as u16) << (i * 2);
    }
    bs
}

pub const INTRA_BS_SENTINEL: u16 = 0xAAAA;

fn alpha_beta(qp_avg: u8, alpha_c_offset: i32, beta_offset: i32) -> (i32, i32) {
    const ALPHA_TAB: [i32; 64] = [
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 4, 4, 5, 6, 7, 8, 9, 10, 12, 13, 15, 17, 20, 22, 25, 28,
        32, 36, 40, 45, 50, 56, 63, 71, 80, 90, 101, 113, 127, 144, 162, 182, 203, 226, 255, 255, 255, 255, 255,
        255, 255, 255, 255, 255, 255, 255, 255, 255,
    ];
    const BETA_TAB: [i32; 64] = [
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 6, 6, 6, 7, 7,
        7, 8, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13, 13, 14, 14, 15, 15, 16, 16, 17, 17, 18, 18, 18, 18, 18, 18,
    ];
    let a_idx = (qp_avg as i32 + alpha_c_offset).clamp(0, 63) as usize;
    let b_idx = (qp_avg as i32 + beta_offset).clamp(0, 63) as usize;
    (ALPHA_TAB[a_idx], BETA_TAB[b_idx])
}

fn clip(v: i32, lo: i32, hi: i32) -> i32 {
    v.clamp(lo, hi)
}

/// Filters one 8-sample edge (`p` = samples on the lower/left side read
/// backward from the edge, `q` = samples on the higher/right side),
/// strength-dependent per §9.5: BS=2 uses the 4-tap strong filter, BS=1
/// the narrower weak filter.
fn filter_edge_line(p: &mut [i32; 3], q: &mut [i32; 3], bs: BoundaryStrength, alpha: i32, beta: i32) {
    let p0 = p[0];
    let p1 = p[1];
    let p2 = p[2];
    let q0 = q[0];
    let q1 = q[1];
    let q2 = q[2];

    if (p0 - q0).abs() >= alpha || (p1 - p0).abs() >= beta || (q1 - q0).abs() >= beta {
        return;
    }

    match bs {
        BoundaryStrength::None => {}
        BoundaryStrength::Weak => {
            let delta = clip(((q0 - p0) * 9 - (q1 - p1) * 3 + 8) >> 4, -beta, beta);
            p[0] = clip(p0 + delta, 0, 255);
            q[0] = clip(q0 - delta, 0, 255);
        }
        BoundaryStrength::Strong => {
            if (p2 - p0).abs() < beta {
                p[0] = (p2 + 2 * p1 + 2 * p0 + 2 * q0 + q1 + 4) >> 3;
                p[1] = (p2 + p1 + p0 + q0 + 2) >> 2;
            } else {
                p[0] = (2 * p1 + p0 + q1 + 2) >> 2;
            }
            if (q2 - q0).abs() < beta {
                q[0] = (q2 + 2 * q1 + 2 * q0 + 2 * p0 + p1 + 4) >> 3;
                q[1] = (q2 + q1 + q0 + p0 + 2) >> 2;
            } else {
                q[0] = (2 * q1 + q0 + p1 + 2) >> 2;
            }
        }
    }
}

fn filter_vertical_edge(plane: &mut Plane, edge_x: i32, y0: i32, len: usize, bs: BoundaryStrength, alpha: i32, beta: i32) {
    if bs == BoundaryStrength::None {
        return;
    }
    for row in 0..len as i32 {
        let y = y0 + row;
        let mut p = [
            plane.get(edge_x - 1, y) as i32,
            plane.get(edge_x - 2, y) as i32,
            plane.get(edge_x - 3, y) as i32,
        ];
        let mut q = [plane.get(edge_x, y) as i32, plane.get(edge_x + 1, y) as i32, plane.get(edge_x + 2, y) as i32];
        filter_edge_line(&mut p, &mut q, bs, alpha, beta);
        plane.set(edge_x - 1, y, p[0] as u8);
        plane.set(edge_x - 2, y, p[1] as u8);
        plane.set(edge_x, y, q[0] as u8);
        plane.set(edge_x + 1, y, q[1] as u8);
    }
}

fn filter_horizontal_edge(plane: &mut Plane, x0: i32, edge_y: i32, len: usize, bs: BoundaryStrength, alpha: i32, beta: i32) {
    if bs == BoundaryStrength::None {
        return;
    }
    for col in 0..len as i32 {
        let x = x0 + col;
        let mut p = [
            plane.get(x, edge_y - 1) as i32,
            plane.get(x, edge_y - 2) as i32,
            plane.get(x, edge_y - 3) as i32,
        ];
        let mut q = [plane.get(x, edge_y) as i32, plane.get(x, edge_y + 1) as i32, plane.get(x, edge_y + 2) as i32];
        filter_edge_line(&mut p, &mut q, bs, alpha, beta);
        plane.set(x, edge_y - 1, p[0] as u8);
        plane.set(x, edge_y - 2, p[1] as u8);
        plane.set(x, edge_y, q[0] as u8);
        plane.set(x, edge_y + 1, q[1] as u8);
    }
}

fn unpack_bs(lf_bs: u16, shift: u16) -> BoundaryStrength {
    match (lf_bs >> shift) & 3 {
        2 => BoundaryStrength::Strong,
        1 => BoundaryStrength::Weak,
        _ => BoundaryStrength::None,
    }
}

/// Deblocks one macroblock's four vertical then four horizontal 8-sample
/// luma edges, in raster order, per the standard's vertical-then-horizontal
/// MB sweep.
pub fn filter_macroblock_luma(plane: &mut Plane, mx: usize, my: usize, mb: &MbContext, alpha_c_offset: i32, beta_offset: i32) {
    let (alpha, beta) = alpha_beta(mb.cur_qp, alpha_c_offset, beta_offset);
    let x0 = (mx * 16) as i32;
    let y0 = (my * 16) as i32;
    for k in 0..2 {
        let edge_x = x0 + 8 * k;
        let bs = unpack_bs(mb.lf_bs, k as u16 * 2);
        if edge_x > 0 {
            filter_vertical_edge(plane, edge_x, y0, 16, bs, alpha, beta);
        }
    }
    for k in 0..2 {
        let edge_y = y0 + 8 * k;
        let bs = unpack_bs(mb.lf_bs, 8 + k as u16 * 2);
        if edge_y > 0 {
            filter_horizontal_edge(plane, x0, edge_y, 16, bs, alpha, beta);
        }
    }
}

/// Deblocks one macroblock's single 8x8 chroma block. The original
/// decoder's `AvsLoopFilter.cpp` has no chroma-specific boundary-strength
/// function; chroma reuses the same left/top edge strengths computed for
/// the luma block (bits 0-1 and 8-9 of `lf_bs`), mapped through the
/// chroma QP table and applied to 8x8 rather than 16x16 geometry.
pub fn filter_macroblock_chroma(plane: &mut Plane, mx: usize, my: usize, mb: &MbContext, alpha_c_offset: i32, beta_offset: i32) {
    let chroma_qp = CHROMA_QP[mb.cur_qp as usize];
    let (alpha, beta) = alpha_beta(chroma_qp, alpha_c_offset, beta_offset);
    let x0 = (mx * 8) as i32;
    let y0 = (my * 8) as i32;

    let left_bs = unpack_bs(mb.lf_bs, 0);
    if x0 > 0 {
        filter_vertical_edge(plane, x0, y0, 8, left_bs, alpha, beta);
    }
    let top_bs = unpack_bs(mb.lf_bs, 8);
    if y0 > 0 {
        filter_horizontal_edge(plane, x0, y0, 8, top_bs, alpha, beta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_edge_smooths_a_step() {
        let mut p = [10, 10, 10];
        let mut q = [200, 200, 200];
        filter_edge_line(&mut p, &mut q, BoundaryStrength::Strong, 255, 18);
        assert!(p[0] > 10);
        assert!(q[0] < 200);
    }

    #[test]
    fn none_strength_leaves_samples_untouched() {
        let mut p = [10, 11, 12];
        let mut q = [200, 201, 202];
        let (op, oq) = (p, q);
        filter_edge_line(&mut p, &mut q, BoundaryStrength::None, 255, 18);
        assert_eq!(p, op);
        assert_eq!(q, oq);
    }

    #[test]
    fn bs_pack_roundtrips_all_strong() {
        let edges = [BoundaryStrength::Strong; 8];
        assert_eq!(pack_bs(edges), INTRA_BS_SENTINEL);
    }
}
