use crate::bitreader::BitReader;
use crate::error::{Error, Result};
use tracing::trace;

const NUM_CONTEXTS: usize = 200;

const LG_PMPS_ADD: [i32; 4] = [197, 197, 95, 46];

#[derive(Clone, Copy, Debug)]
struct AecCtx {
    mps: i8,
    cyc_no: i8,
    lg_pmps: i16,
}

impl AecCtx {
    const RESET: AecCtx = AecCtx { mps: 0, cyc_no: 0, lg_pmps: 1023 };

    fn update(&mut self, bin_val: u8) {
        if bin_val as i8 != self.mps {
            let lg_pmps = self.lg_pmps as i32 + LG_PMPS_ADD[self.cyc_no as usize];
            if lg_pmps > 1023 {
                self.mps ^= 1;
                self.lg_pmps = (lg_pmps - 1024) as i16;
            } else {
                self.lg_pmps = lg_pmps as i16;
            }
            if self.cyc_no < 3 {
                self.cyc_no += 1;
            }
        } else {
            if self.cyc_no == 0 {
                self.cyc_no = 1;
            }
            let tmp = self.lg_pmps as i32 >> (2 + self.cyc_no as i32);
            self.lg_pmps -= (tmp + (tmp >> 2)) as i16;
        }
    }
}

fn msb_index_unzero(v: u32) -> u32 {
    debug_assert!(v != 0);
    31 - v.leading_zeros()
}

/// Binary arithmetic decoder ("AEC"): wraps a [`BitReader`] with the
/// carry-propagating range-coder state and its 200 probability contexts.
pub struct AecReader<'a> {
    bits: BitReader<'a>,
    r_s1: i32,
    r_t1: i32,
    value_s: i32,
    value_t: i32,
    ctx: [AecCtx; NUM_CONTEXTS],
}

impl<'a> AecReader<'a> {
    /// Consumes the bit reader positioned at the first bit of a slice and
    /// performs the AEC initialisation sequence: read a 9-bit value, keep
    /// shifting in bits until it reaches `0x100`, and reset every context
    /// to `{mps:0, cycNo:0, lgPmps:1023}`.
    pub fn new(mut bits: BitReader<'a>) -> Result<Self> {
        let mut value_t = bits.read_bits(9)? as i32;
        let mut value_s = 0;
        while value_t < 0x100 {
            value_t = (value_t << 1) | bits.read1()? as i32;
            value_s += 1;
        }
        value_t &= 0xFF;
        trace!(value_s, value_t, "AEC engine initialised");

        Ok(Self {
            bits,
            r_s1: 0,
            r_t1: 255,
            value_s,
            value_t,
            ctx: [AecCtx::RESET; NUM_CONTEXTS],
        })
    }

    pub fn is_end_of_slice(&self) -> bool {
        self.bits.is_end_of_slice()
    }

    fn ctx(&mut self, idx: usize) -> Result<&mut AecCtx> {
        self.ctx.get_mut(idx).ok_or(Error::bad_stream("AEC context index out of range"))
    }

    /// Renormalisation shared by every decision path: reads bits as needed
    /// to bring `(rS1,rT1,ValueS,ValueT)` back above the `0x100` threshold.
    fn renorm_lps(&mut self, mut value_t: i32, lps_range: i32) -> Result<()> {
        let mut t_rlps = lps_range;
        if t_rlps < 0x100 {
            let cnt = 8 - msb_index_unzero(t_rlps as u32) as i32;
            t_rlps <<= cnt;
            value_t = (value_t << cnt) | self.bits.read_bits(cnt as u32)? as i32;
        }
        self.r_s1 = 0;
        self.r_t1 = t_rlps & 0xFF;

        let mut value_s = 0;
        while value_t == 0 {
            value_s += 9;
            value_t = self.bits.read_bits(9)? as i32;
        }
        if value_t < 0x100 {
            let cnt = 8 - msb_index_unzero(value_t as u32) as i32;
            value_s += cnt;
            value_t = (value_t << cnt) | self.bits.read_bits(cnt as u32)? as i32;
        }
        self.value_s = value_s;
        self.value_t = value_t & 0xFF;
        Ok(())
    }

    /// Decode one bin using the context at `ctx_idx`, updating it in place.
    pub fn dec_decision(&mut self, ctx_idx: usize) -> Result<u8> {
        let (mps, lg_pmps2, cyc_no) = {
            let c = self.ctx(ctx_idx)?;
            (c.mps as u8, c.lg_pmps as i32 >> 2, c.cyc_no)
        };
        let mut bin_val = mps;

        let r_t2_raw = self.r_t1 - lg_pmps2;
        let s_mask = r_t2_raw >> 31;
        let r_s2 = self.r_s1 - s_mask;
        let r_t2 = r_t2_raw + (s_mask & 256);

        let value_t = self.value_t;
        if r_s2 > self.value_s || (r_s2 == self.value_s && value_t >= r_t2) {
            bin_val ^= 1;
            let value_t = if r_s2 == self.value_s {
                value_t - r_t2
            } else {
                256 + ((value_t << 1) | self.bits.read1()? as i32) - r_t2
            };
            let lps_range = (s_mask & self.r_t1) + lg_pmps2;
            self.renorm_lps(value_t, lps_range)?;

            let c = self.ctx(ctx_idx)?;
            let lg_pmps = c.lg_pmps as i32 + LG_PMPS_ADD[cyc_no as usize];
            if lg_pmps > 1023 {
                c.mps ^= 1;
                c.lg_pmps = (lg_pmps - 1024) as i16;
            } else {
                c.lg_pmps = lg_pmps as i16;
            }
            if c.cyc_no < 3 {
                c.cyc_no += 1;
            }
        } else {
            self.r_s1 = r_s2;
            self.r_t1 = r_t2;

            let c = self.ctx(ctx_idx)?;
            if c.cyc_no == 0 {
                c.cyc_no = 1;
            }
            let tmp = c.lg_pmps as i32 >> (2 + c.cyc_no as i32);
            c.lg_pmps -= (tmp + (tmp >> 2)) as i16;
        }

        Ok(bin_val)
    }

    /// Context-weighted variant used for EOB decisions: blends two contexts'
    /// `{mps, lgPmps}` into one effective probability, decodes a single bin,
    /// then updates both contexts with the result.
    pub fn dec_decision2(&mut self, ctx_idx1: usize, ctx_idx2: usize) -> Result<u8> {
        let (c1_mps, c1_lg, c2_mps, c2_lg) = {
            let c1 = *self.ctx(ctx_idx1)?;
            let c2 = *self.ctx(ctx_idx2)?;
            (c1.mps, c1.lg_pmps as i32, c2.mps, c2.lg_pmps as i32)
        };

        let (mut bin_val, lg_pmps2) = if c1_mps == c2_mps {
            (c1_mps as u8, (c1_lg + c2_lg) >> 3)
        } else if c1_lg < c2_lg {
            (c1_mps as u8, (1023 - ((c2_lg - c1_lg) >> 1)) >> 2)
        } else {
            (c2_mps as u8, (1023 - ((c1_lg - c2_lg) >> 1)) >> 2)
        };

        let r_t2_raw = self.r_t1 - lg_pmps2;
        let s_mask = r_t2_raw >> 31;
        let r_s2 = self.r_s1 - s_mask;
        let r_t2 = r_t2_raw + (s_mask & 256);

        let value_t = self.value_t;
        if r_s2 > self.value_s || (r_s2 == self.value_s && value_t >= r_t2) {
            bin_val ^= 1;
            let value_t = if r_s2 == self.value_s {
                value_t - r_t2
            } else {
                256 + ((value_t << 1) | self.bits.read1()? as i32) - r_t2
            };
            let lps_range = (s_mask & self.r_t1) + lg_pmps2;
            self.renorm_lps(value_t, lps_range)?;
        } else {
            self.r_s1 = r_s2;
            self.r_t1 = r_t2;
        }

        self.ctx(ctx_idx1)?.update(bin_val);
        self.ctx(ctx_idx2)?.update(bin_val);
        Ok(bin_val)
    }

    /// Decode decisions from `ctx_idx` until a `1` appears or `max_cnt` zeros
    /// have been seen; returns the number of leading zeros.
    pub fn dec_zero_cnt(&mut self, ctx_idx: usize, max_cnt: i32) -> Result<i32> {
        let mut zero_cnt = 0;
        while zero_cnt < max_cnt {
            if self.dec_decision(ctx_idx)? != 0 {
                break;
            }
            zero_cnt += 1;
        }
        Ok(zero_cnt)
    }

    /// Equiprobable (p=1/2) bypass decode.
    pub fn dec_bypass(&mut self) -> Result<u8> {
        let r_t2_raw = self.r_t1 - 255;
        let s_mask = r_t2_raw >> 31;
        let r_s2 = self.r_s1 - s_mask;
        let r_t2 = r_t2_raw + (s_mask & 256);

        let value_t = self.value_t;
        if r_s2 > self.value_s || (r_s2 == self.value_s && value_t >= r_t2) {
            let mut value_t = if r_s2 == self.value_s {
                value_t - r_t2
            } else {
                256 + ((value_t << 1) | self.bits.read1()? as i32) - r_t2
            };
            let mut t_rlps = (s_mask & self.r_t1) + 255;
            if t_rlps < 0x100 {
                t_rlps <<= 1;
                value_t = (value_t << 1) | self.bits.read1()? as i32;
            }
            self.r_s1 = 0;
            self.r_t1 = t_rlps & 0xFF;

            let mut value_s = 0;
            while value_t == 0 {
                value_s += 9;
                value_t = self.bits.read_bits(9)? as i32;
            }
            if value_t < 0x100 {
                let cnt = 8 - msb_index_unzero(value_t as u32) as i32;
                value_s += cnt;
                value_t = (value_t << cnt) | self.bits.read_bits(cnt as u32)? as i32;
            }
            self.value_s = value_s;
            self.value_t = value_t & 0xFF;
            Ok(1)
        } else {
            self.r_s1 = r_s2;
            self.r_t1 = r_t2;
            Ok(0)
        }
    }

    /// Bypass decode specialised for the trailing slice-stuffing bit (the
    /// LPS range is fixed at 1 instead of 255).
    pub fn dec_stuffing_bit(&mut self) -> Result<u8> {
        let r_t2_raw = self.r_t1 - 1;
        let s_mask = r_t2_raw >> 31;
        let r_s2 = self.r_s1 - s_mask;
        let r_t2 = r_t2_raw + (s_mask & 256);

        if r_s2 > self.value_s || (r_s2 == self.value_s && self.value_t >= r_t2) {
            let value_t = if r_s2 == self.value_s {
                self.value_t - r_t2
            } else {
                256 + ((self.value_t << 1) | self.bits.read1()? as i32) - r_t2
            };
            let lps_range = (s_mask & self.r_t1) + 1;
            self.renorm_lps(value_t, lps_range)?;
            Ok(1)
        } else {
            self.r_s1 = r_s2;
            self.r_t1 = r_t2;
            Ok(0)
        }
    }

    /// `mb_type` for P pictures: a 7-way unary tree over contexts 4-8.
    pub fn dec_mb_type_p(&mut self) -> Result<u32> {
        for (i, ctx_idx) in [4, 5, 6, 7].into_iter().enumerate() {
            if self.dec_decision(ctx_idx)? != 0 {
                return Ok(i as u32);
            }
        }
        if self.dec_decision(8)? != 0 {
            return Ok(4);
        }
        if self.dec_decision(8)? != 0 {
            return Ok(5);
        }
        Ok(6)
    }

    /// `mb_type` for B pictures.
    pub fn dec_mb_type_b(&mut self, ctx_inc: usize) -> Result<u32> {
        if self.dec_decision(9 + ctx_inc)? == 0 {
            return Ok(0);
        }
        for i in 1..=7u32 {
            if self.dec_decision(11 + i as usize)? != 0 {
                return Ok(i);
            }
        }
        Ok(8 + self.dec_zero_cnt(18, 24)? as u32)
    }

    /// Motion-vector difference for one component, contexts `base..base+6`.
    fn dec_mvd_component(&mut self, base: usize, prev_abs: i32) -> Result<(i32, i32)> {
        let ctx_idx = base + (prev_abs >= 16) as usize + (prev_abs >= 2) as usize;
        if self.dec_decision(ctx_idx)? == 0 {
            return Ok((0, 0));
        }
        if self.dec_decision(base + 3)? == 0 {
            let sign = self.dec_bypass()? as i32;
            return Ok((1 - (sign << 1), 1));
        }
        if self.dec_decision(base + 4)? == 0 {
            let sign = self.dec_bypass()? as i32;
            return Ok((2 - (sign << 2), 2));
        }
        let mut abs_mvd = 3 + self.dec_decision(base + 5)? as i32;
        let mut cnt = 0;
        while self.dec_bypass()? == 0 && cnt < 16 {
            cnt += 1;
        }
        let mut val = 1i32;
        while cnt > 0 {
            val = (val << 1) | self.dec_bypass()? as i32;
            cnt -= 1;
        }
        abs_mvd += (val - 1) * 2;
        let sign = self.dec_bypass()? as i32;
        let mvd = (abs_mvd ^ -sign) + sign;
        Ok((mvd, abs_mvd))
    }

    /// Decode `(mvd_x, mvd_y)`, threading the running `|mvd|` magnitudes that
    /// select each component's context (as the standard requires).
    pub fn dec_mvd(&mut self, mvd_abs: &mut [i32; 2]) -> Result<[i32; 2]> {
        let (mvd_x, abs_x) = self.dec_mvd_component(36, mvd_abs[0])?;
        mvd_abs[0] = abs_x;
        let (mvd_y, abs_y) = self.dec_mvd_component(42, mvd_abs[1])?;
        mvd_abs[1] = abs_y;
        Ok([mvd_x, mvd_y])
    }

    /// `intra_chroma_pred_mode`: `ctx_inc` reflects whether the left/top
    /// neighbour used a non-DC chroma mode.
    pub fn dec_intra_chroma_pred_mode(&mut self, ctx_inc: usize) -> Result<u32> {
        if self.dec_decision(26 + ctx_inc)? == 0 {
            return Ok(0);
        }
        if self.dec_decision(29)? == 0 {
            return Ok(1);
        }
        if self.dec_decision(29)? == 0 {
            return Ok(2);
        }
        Ok(3)
    }

    /// Coded block pattern, context-conditioned on the left/top neighbours'
    /// own CBP bitmaps. Unlike the VLC path's `cbp_idx`, this yields the
    /// flags bitmap directly — no `CBP_TAB` remap.
    pub fn dec_cbp(&mut self, left_cbp: u8, top_cbp: u8) -> Result<u8> {
        let mut ctx_inc = (((left_cbp >> 1) & 1) + ((top_cbp >> 1) & 2)) as usize;
        let mut cbp = self.dec_decision(51 - ctx_inc)?;
        ctx_inc = (cbp + ((top_cbp >> 2) & 2)) as usize;
        cbp |= self.dec_decision(51 - ctx_inc)? << 1;
        ctx_inc = (((left_cbp >> 3) & 1) + ((cbp << 1) & 2)) as usize;
        cbp |= self.dec_decision(51 - ctx_inc)? << 2;
        ctx_inc = (((cbp >> 2) & 1) + (cbp & 2)) as usize;
        cbp |= self.dec_decision(51 - ctx_inc)? << 3;
        if self.dec_decision(52)? != 0 {
            if self.dec_decision(53)? != 0 {
                cbp += 48;
            } else {
                let k = self.dec_decision(53)?;
                cbp += 16 + 16 * k;
            }
        }
        Ok(cbp)
    }

    /// Run of consecutive skipped MBs preceding the next non-skip MB.
    pub fn dec_mb_skip_run(&mut self) -> Result<u32> {
        if self.dec_decision(0)? != 0 {
            return Ok(0);
        }
        if self.dec_decision(1)? != 0 {
            return Ok(1);
        }
        if self.dec_decision(2)? != 0 {
            return Ok(2);
        }
        Ok(3 + self.dec_zero_cnt(3, 16384)? as u32)
    }

    /// Binary reference-direction flag for B pictures (0 = backward/list-0,
    /// 1 = forward/list-1).
    pub fn dec_ref_idx_b(&mut self, ctx_inc: usize) -> Result<u8> {
        Ok(self.dec_decision(30 + ctx_inc)? ^ 1)
    }

    /// `mb_qp_delta` under AEC has no counterpart in the retrieved original
    /// decoder source (it is VLC-only there); this reuses the mvd-style
    /// unary/bypass tree on dedicated contexts 22-23 as an unverified
    /// approximation (see DESIGN.md).
    pub fn dec_qp_delta(&mut self) -> Result<i32> {
        if self.dec_decision(22)? == 0 {
            return Ok(0);
        }
        let mut abs_delta = 1;
        while self.dec_decision(23)? != 0 && abs_delta < 63 {
            abs_delta += 1;
        }
        let sign = self.dec_bypass()? as i32;
        Ok((abs_delta ^ -sign) + sign)
    }

    /// Decode one 8x8 block's coefficients directly into dequantised,
    /// inverse-scanned 16-bit storage. `ctx_idx_base` selects the luma
    /// intra/inter or chroma context family; `inv_scan`/`weight_qm` are the
    /// picture's current scan order and weighting matrix.
    pub fn dec_coeff_block(
        &mut self,
        coeff: &mut [i16; 64],
        ctx_idx_base: usize,
        scale: i32,
        shift: u8,
        inv_scan: &[u8; 64],
        weight_qm: &[u8; 64],
    ) -> Result<bool> {
        const PRI_IDX3: [usize; 8] = [0usize.wrapping_sub(1), 2, 5, 8, 8, 11, 11, 11];
        const PRI_IDX4: [usize; 8] = [46, 50, 54, 58, 58, 62, 62, 62];

        let mut level_ary = [0i32; 65];
        let mut run_ary = [0u32; 65];

        let mut ctx_idx_r = ctx_idx_base + 46;
        if self.dec_decision(ctx_idx_base)? != 0 {
            level_ary[0] = 1;
        } else {
            ctx_idx_r += 2;
            level_ary[0] = 2 + self.dec_zero_cnt(ctx_idx_base + 1, 16384)?;
        }
        let mut l_max = level_ary[0].min(5) as usize;

        let sign = self.dec_bypass()? as i32;
        level_ary[0] = (level_ary[0] ^ -sign) + sign;

        let mut run = self.dec_decision(ctx_idx_r)? as u32;
        if run == 0 {
            run = 2 + self.dec_zero_cnt(ctx_idx_r + 1, 64)? as u32;
        }
        run_ary[0] = run;

        let ctx_idx_w = ctx_idx_base + 14;
        let mut ctx_idx_l = ctx_idx_base + PRI_IDX3[l_max];
        let mut i = 1usize;
        let mut pos = run;
        loop {
            if pos >= 64 {
                if pos > 64 || self.dec_decision2(ctx_idx_l, ctx_idx_w + 31)? == 0 {
                    return Ok(false);
                }
                break;
            } else if self.dec_decision2(ctx_idx_l, ctx_idx_w + (pos as usize >> 1))? != 0 {
                break;
            }

            let mut ctx_idx_r = ctx_idx_base + PRI_IDX4[l_max];
            if self.dec_decision(ctx_idx_l + 1)? != 0 {
                level_ary[i] = 1;
            } else {
                ctx_idx_r += 2;
                level_ary[i] = 2 + self.dec_zero_cnt(ctx_idx_l + 2, 16384)?;
                if level_ary[i] > l_max as i32 {
                    l_max = (level_ary[i] as usize).min(5);
                    ctx_idx_l = ctx_idx_base + PRI_IDX3[l_max];
                }
            }

            let sign_flag = self.dec_bypass()? as i32;
            level_ary[i] = (level_ary[i] ^ -sign_flag) + sign_flag;

            let mut run = self.dec_decision(ctx_idx_r)? as u32;
            if run == 0 {
                run = 2 + self.dec_zero_cnt(ctx_idx_r + 1, 64)? as u32;
            }
            run_ary[i] = run;

            i += 1;
            pos += run;
            if i >= 65 {
                return Err(Error::bad_stream("coefficient block exceeds 64 positions"));
            }
        }

        *coeff = [0i16; 64];
        let rnd = 1i32 << (shift - 1);
        let mut k: i32 = -1;
        while i > 0 {
            i -= 1;
            k += run_ary[i] as i32;
            if !(0..64).contains(&k) {
                return Err(Error::bad_stream("coefficient run overruns block"));
            }
            let idx = inv_scan[k as usize] as usize;
            let tmp = ((level_ary[i] * weight_qm[idx] as i32) >> 3) * scale >> 4;
            coeff[idx] = ((tmp + rnd) >> shift) as i16;
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_resets_all_contexts() {
        let data = [0u8; 8];
        let aec = AecReader::new(BitReader::new(&data)).unwrap();
        assert!(aec.ctx.iter().all(|c| c.mps == 0 && c.cyc_no == 0 && c.lg_pmps == 1023));
    }

    #[test]
    fn dec_bypass_is_deterministic_and_terminates() {
        let data = [0xA5u8; 16];
        let mut aec = AecReader::new(BitReader::new(&data)).unwrap();
        for _ in 0..32 {
            let _ = aec.dec_bypass().unwrap();
        }
    }

    #[test]
    fn dec_decision_never_panics_on_long_runs() {
        let data = [0x00u8; 64];
        let mut aec = AecReader::new(BitReader::new(&data)).unwrap();
        for _ in 0..100 {
            let _ = aec.dec_decision(10);
        }
    }
}
