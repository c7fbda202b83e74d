/// Slice-level dispatch: locates slice start codes inside a picture unit
/// and decodes each macroblock row, stitching `mb::dec_macroblock_i8x8`/
/// `dec_macroblock_inter` into one reconstructed picture.
use crate::aec::AecReader;
use crate::bitreader::BitReader;
use crate::consts::{expand_weight_quant_matrix, INV_SCAN_FIELD, INV_SCAN_FRAME, WQ_FLAT};
use crate::enums::PicType;
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::headers::PictureHeader;
use crate::inter::Mv;
use crate::mb::{dec_macroblock_i8x8, dec_macroblock_inter, CoeffReader, MbContext};
use crate::vlc::VlcFamily;

/// Slice start codes occupy `0x00..=0xAF`, distinct from the sequence/
/// picture start codes (`>= 0xB0`) `decoder::find_start_codes` already
/// separates coded units on.
fn find_slice_starts(data: &[u8]) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut i = 0usize;
    while i + 3 < data.len() {
        if data[i] == 0 && data[i + 1] == 0 && data[i + 2] == 1 && data[i + 3] <= 0xAF {
            starts.push(i);
            i += 4;
        } else {
            i += 1;
        }
    }
    starts
}

/// Decodes every slice in `data` (the picture unit's bytes, header already
/// consumed) into `frame`, returning the per-MB neighbour state the loop
/// filter pass needs. `ref_frame` is the backward reference used for P/B
/// inter prediction; `fwd_frame`/`fwd_mb_ctx` are the additional forward
/// reference and its stored per-MB motion used only for B pictures'
/// bi-prediction and direct/skip mode (see DESIGN.md).
#[allow(clippy::too_many_arguments)]
pub fn decode_slices(
    data: &[u8],
    hdr: &PictureHeader,
    frame: &mut Frame,
    ref_frame: Option<&Frame>,
    fwd_frame: Option<&Frame>,
    fwd_mb_ctx: Option<&Vec<Vec<MbContext>>>,
    mb_cols: usize,
    mb_rows: usize,
    ref_dist: i32,
    ref_dist_fwd: i32,
) -> Result<Vec<Vec<MbContext>>> {
    let mut mb_ctx: Vec<Vec<MbContext>> = vec![vec![MbContext::default(); mb_cols]; mb_rows];
    let starts = find_slice_starts(data);
    if starts.is_empty() {
        return Err(Error::bad_stream("no slice start code found in picture"));
    }

    let inv_scan = if hdr.progressive_frame { &INV_SCAN_FRAME } else { &INV_SCAN_FIELD };
    let weight_qm = if hdr.weight_quant_flag {
        expand_weight_quant_matrix(hdr.weight_quant_model, &hdr.weight_quant_param_delta.map(|d| d as u8))
    } else {
        WQ_FLAT
    };

    let pic_type = match hdr.pic_type {
        x if x == PicType::I as u8 => PicType::I,
        x if x == PicType::P as u8 => PicType::P,
        _ => PicType::B,
    };

    for (k, &start) in starts.iter().enumerate() {
        let end = starts.get(k + 1).copied().unwrap_or(data.len());
        let slice_data = &data[start + 4..end];
        if slice_data.is_empty() {
            continue;
        }
        let mb_row = data[start + 3] as usize;
        if mb_row >= mb_rows {
            continue;
        }

        let mut bits = BitReader::new(slice_data);
        // Slice header: mirrors the picture header's own qp encoding
        // (`fixed_slice_qp`, `slice_qp`) before the first MB's syntax.
        let fixed_slice_qp = bits.read1()? != 0;
        let mut cur_qp = bits.read_bits(6)? as u8;
        if !fixed_slice_qp {
            cur_qp = hdr.pic_qp;
        }

        let mut aec_reader = if hdr.aec_enable {
            bits.make_byte_aligned();
            let remainder = BitReader::new(&slice_data[bits.byte_pos()..]);
            Some(AecReader::new(remainder)?)
        } else {
            None
        };

        let mut left_ctx = MbContext::default();
        let mut skip_run_remaining: u32 = 0;
        let mut mvd_abs_ctx = [0i32; 2];
        let is_inter = pic_type != PicType::I;

        for mx in 0..mb_cols {
            let top_ctx = if mb_row == 0 { MbContext::default() } else { mb_ctx[mb_row - 1][mx] };
            let top_right_ctx =
                if mb_row == 0 || mx + 1 >= mb_cols { MbContext::default() } else { mb_ctx[mb_row - 1][mx + 1] };

            let mut top_copy = top_ctx;
            let mut cur_mb = MbContext::default();

            let family = if pic_type == PicType::I { VlcFamily::IntraLuma } else { VlcFamily::InterLuma };

            // Resolve skip/mb_type before building the CoeffReader wrapper,
            // since the AEC path threads a skip-run counter across MBs and
            // the VLC path reads its own per-MB flag directly off `bits`.
            let skip = if is_inter {
                if hdr.aec_enable {
                    let aec = aec_reader.as_mut().expect("aec_enable checked above");
                    if skip_run_remaining > 0 {
                        skip_run_remaining -= 1;
                        true
                    } else {
                        let run = aec.dec_mb_skip_run()?;
                        if run > 0 {
                            skip_run_remaining = run - 1;
                            true
                        } else {
                            false
                        }
                    }
                } else {
                    bits.read_ue8()? == 0
                }
            } else {
                false
            };

            // Non-skip inter MBs under AEC still carry an `mb_type` field in
            // the bitstream; only its bit length matters here since multi-
            // partition/multi-reference mb_types are not modelled (see
            // DESIGN.md).
            if is_inter && !skip && hdr.aec_enable {
                let aec = aec_reader.as_mut().expect("aec_enable checked above");
                let _mb_type = if pic_type == PicType::P { aec.dec_mb_type_p()? } else { aec.dec_mb_type_b(0)? };
            }

            let col_mv = fwd_mb_ctx.map(|ctx| ctx[mb_row][mx].mv);

            let result = if hdr.aec_enable {
                let mut reader = CoeffReader::Aec(aec_reader.as_mut().expect("aec_enable checked above"));
                dispatch_mb(
                    &mut reader,
                    pic_type,
                    skip,
                    &mut left_ctx,
                    &mut top_copy,
                    &top_right_ctx,
                    &mut cur_mb,
                    frame,
                    ref_frame,
                    fwd_frame,
                    col_mv,
                    &mut mvd_abs_ctx,
                    mx,
                    mb_row,
                    &mut cur_qp,
                    hdr.fixed_pic_qp,
                    hdr.loop_filter_disable,
                    ref_dist,
                    ref_dist_fwd,
                    family,
                    inv_scan,
                    &weight_qm,
                    hdr.chroma_quant_delta_cb,
                    hdr.chroma_quant_delta_cr,
                )
            } else {
                let mut reader = CoeffReader::Vlc(&mut bits);
                dispatch_mb(
                    &mut reader,
                    pic_type,
                    skip,
                    &mut left_ctx,
                    &mut top_copy,
                    &top_right_ctx,
                    &mut cur_mb,
                    frame,
                    ref_frame,
                    fwd_frame,
                    col_mv,
                    &mut mvd_abs_ctx,
                    mx,
                    mb_row,
                    &mut cur_qp,
                    hdr.fixed_pic_qp,
                    hdr.loop_filter_disable,
                    ref_dist,
                    ref_dist_fwd,
                    family,
                    inv_scan,
                    &weight_qm,
                    hdr.chroma_quant_delta_cb,
                    hdr.chroma_quant_delta_cr,
                )
            };
            result?;

            mb_ctx[mb_row][mx] = cur_mb;
        }
    }

    Ok(mb_ctx)
}

#[allow(clippy::too_many_arguments)]
fn dispatch_mb(
    reader: &mut CoeffReader,
    pic_type: PicType,
    skip: bool,
    left_mb: &mut MbContext,
    top_mb: &mut MbContext,
    top_right_mb: &MbContext,
    cur_mb: &mut MbContext,
    frame: &mut Frame,
    ref_frame: Option<&Frame>,
    fwd_frame: Option<&Frame>,
    col_mv: Option<Mv>,
    mvd_abs_ctx: &mut [i32; 2],
    mx: usize,
    my: usize,
    cur_qp: &mut u8,
    fixed_qp: bool,
    lf_disabled: bool,
    ref_dist: i32,
    ref_dist_fwd: i32,
    family: VlcFamily,
    inv_scan: &[u8; 64],
    weight_qm: &[u8; 64],
    chroma_delta_cb: i32,
    chroma_delta_cr: i32,
) -> Result<()> {
    match pic_type {
        PicType::I => dec_macroblock_i8x8(
            reader,
            left_mb,
            top_mb,
            cur_mb,
            frame,
            mx,
            my,
            cur_qp,
            fixed_qp,
            lf_disabled,
            false,
            0,
            chroma_delta_cb,
            chroma_delta_cr,
            family,
            inv_scan,
            weight_qm,
        ),
        PicType::P | PicType::B => {
            let ref_frame = ref_frame.ok_or_else(|| Error::bad_stream("inter picture decoded without a reference"))?;
            let is_b = pic_type == PicType::B;
            dec_macroblock_inter(
                reader,
                left_mb,
                top_mb,
                top_right_mb,
                cur_mb,
                frame,
                ref_frame,
                fwd_frame,
                is_b,
                col_mv,
                ref_dist_fwd,
                mvd_abs_ctx,
                mx,
                my,
                cur_qp,
                fixed_qp,
                lf_disabled,
                skip,
                ref_dist,
                family,
                inv_scan,
                weight_qm,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_starts_exclude_picture_and_sequence_codes() {
        let data = [0, 0, 1, 0x00, 1, 2, 0, 0, 1, 0xB0, 3, 4];
        assert_eq!(find_slice_starts(&data), vec![0]);
    }

    #[test]
    fn decode_slices_rejects_data_without_a_slice_start_code() {
        let hdr = PictureHeader { pic_type: PicType::I as u8, ..Default::default() };
        let mut frame = Frame::new(16, 16);
        let err = decode_slices(&[1, 2, 3, 4], &hdr, &mut frame, None, None, None, 1, 1, 1, 1);
        assert!(err.is_err());
    }
}
