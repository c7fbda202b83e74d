use crate::bitreader::BitReader;
use crate::enums::PicType;
use crate::error::{Error, Result};
use tracing::trace;

pub const PROFILE_JIZHUN: u8 = 0x20;
pub const PROFILE_BROADCAST: u8 = 0x48;

/// Sequence header (GY/T 257.1-2012 §7.1.2.2).
#[derive(Clone, Debug, Default)]
pub struct SequenceHeader {
    pub profile: u8,
    pub level: u8,
    pub progressive_seq: bool,
    pub width: u16,
    pub height: u16,
    pub chroma_format: u8,
    pub sample_precision: u8,
    pub aspect_ratio: u8,
    pub frame_rate_code: u8,
    pub bitrate: u32,
    pub low_delay: bool,
    pub bbv_buffer_size: u32,
}

/// Picture header, shared shape for I and P/B pictures (§7.1.3.1/§7.1.3.2).
#[derive(Clone, Debug, Default)]
pub struct PictureHeader {
    pub bbv_delay: u32,
    pub time_code_flag: bool,
    pub time_code: u32,
    pub pic_type: u8,
    pub pic_distance: u32,
    pub bbv_check_times: u32,
    pub progressive_frame: bool,
    pub picture_structure: bool,
    pub top_field_first: bool,
    pub repeat_first_field: bool,
    pub fixed_pic_qp: bool,
    pub pic_qp: u8,
    pub pic_ref_flag: bool,
    pub no_fwd_ref_flag: bool,
    pub pb_field_enhanced_flag: bool,
    pub skip_mode_flag: bool,
    pub loop_filter_disable: bool,
    pub loop_filter_param_flag: bool,
    pub alpha_c_offset: i32,
    pub beta_offset: i32,
    pub weight_quant_flag: bool,
    pub chroma_quant_param_disable: bool,
    pub chroma_quant_delta_cb: i32,
    pub chroma_quant_delta_cr: i32,
    pub weight_quant_index: u8,
    pub weight_quant_model: u8,
    pub weight_quant_param_delta: [i32; 8],
    pub aec_enable: bool,
}

impl Default for PicType {
    fn default() -> Self {
        PicType::I
    }
}

pub fn parse_sequence_header(data: &[u8]) -> Result<SequenceHeader> {
    if data.len() < 18 {
        return Err(Error::bad_stream("sequence header too short"));
    }
    let mut bits = BitReader::new(&data[6..]);
    let mut hdr = SequenceHeader {
        profile: data[4],
        level: data[5],
        ..Default::default()
    };

    hdr.progressive_seq = bits.read1()? != 0;
    hdr.width = bits.read_bits(14)? as u16;
    hdr.height = bits.read_bits(14)? as u16;
    hdr.chroma_format = bits.read_bits(2)? as u8;
    hdr.sample_precision = bits.read_bits(3)? as u8;
    hdr.aspect_ratio = bits.read_bits(4)? as u8;
    hdr.frame_rate_code = bits.read_bits(4)? as u8;
    hdr.bitrate = bits.read_bits(18)?;
    bits.skip_bits(1)?;
    hdr.bitrate += bits.read_bits(12)? << 18;
    hdr.low_delay = bits.read1()? != 0;
    bits.skip_bits(1)?;
    hdr.bbv_buffer_size = bits.read_bits(18)?;
    trace!(width = hdr.width, height = hdr.height, chroma_format = hdr.chroma_format, "sequence header fields decoded");
    Ok(hdr)
}

fn parse_loop_filter(bits: &mut BitReader, hdr: &mut PictureHeader) -> Result<()> {
    hdr.loop_filter_disable = bits.read1()? != 0;
    if !hdr.loop_filter_disable {
        hdr.loop_filter_param_flag = bits.read1()? != 0;
        if hdr.loop_filter_param_flag {
            hdr.alpha_c_offset = bits.read_se8()?;
            hdr.beta_offset = bits.read_se8()?;
        }
        if !(-8..=8).contains(&hdr.alpha_c_offset) {
            return Err(Error::bad_stream("alpha_c_offset out of range"));
        }
        if !(-8..=8).contains(&hdr.beta_offset) {
            return Err(Error::bad_stream("beta_offset out of range"));
        }
    }
    Ok(())
}

fn parse_weight_quant(bits: &mut BitReader, seq: &SequenceHeader, hdr: &mut PictureHeader) -> Result<()> {
    if seq.profile != PROFILE_BROADCAST {
        return Ok(());
    }
    if bits.bits_left() == 0 {
        return Err(Error::bad_stream("picture header exhausted before broadcast fields"));
    }

    hdr.weight_quant_flag = bits.read1()? != 0;
    if hdr.weight_quant_flag {
        bits.skip_bits(1)?;
        hdr.chroma_quant_param_disable = bits.read1()? != 0;
        if !hdr.chroma_quant_param_disable {
            hdr.chroma_quant_delta_cb = bits.read_se8()?;
            hdr.chroma_quant_delta_cr = bits.read_se8()?;
            if !(-16..=16).contains(&hdr.chroma_quant_delta_cb) {
                return Err(Error::bad_stream("chroma_quant_delta_cb out of range"));
            }
            if !(-16..=16).contains(&hdr.chroma_quant_delta_cr) {
                return Err(Error::bad_stream("chroma_quant_delta_cr out of range"));
            }
        }

        hdr.weight_quant_index = bits.read_bits(2)? as u8;
        hdr.weight_quant_model = bits.read_bits(2)? as u8;
        if hdr.weight_quant_index == 3 || hdr.weight_quant_model == 3 {
            return Err(Error::bad_stream("reserved weight_quant_index/model value"));
        }
        if hdr.weight_quant_index != 0 {
            for delta in hdr.weight_quant_param_delta[..6].iter_mut() {
                let d = bits.read_se8()?;
                if !(-128..=127).contains(&d) {
                    return Err(Error::bad_stream("weight_quant_param_delta out of range"));
                }
                *delta = d;
            }
        }
    }

    hdr.aec_enable = bits.read1()? != 0;
    Ok(())
}

pub fn parse_picture_header_i(data: &[u8], seq: &SequenceHeader) -> Result<PictureHeader> {
    if data.len() < 8 {
        return Err(Error::bad_stream("I-picture header too short"));
    }
    let mut bits = BitReader::new(&data[4..]);
    let mut hdr = PictureHeader::default();

    hdr.bbv_delay = bits.read_bits(16)?;
    if seq.profile == PROFILE_BROADCAST {
        bits.skip_bits(1)?;
        hdr.bbv_delay = (hdr.bbv_delay << 7) + bits.read_bits(7)?;
    }

    hdr.time_code_flag = bits.read1()? != 0;
    hdr.time_code = if hdr.time_code_flag { bits.read_bits(24)? } else { 0 };

    bits.skip_bits(1)?;
    hdr.pic_type = PicType::I as u8;
    hdr.pic_distance = bits.read_bits(8)?;

    hdr.bbv_check_times = if seq.low_delay { bits.read_ue8()? } else { 0 };

    hdr.progressive_frame = bits.read1()? != 0;
    hdr.picture_structure = if !hdr.progressive_frame { bits.read1()? != 0 } else { true };

    hdr.top_field_first = bits.read1()? != 0;
    hdr.repeat_first_field = bits.read1()? != 0;

    hdr.fixed_pic_qp = bits.read1()? != 0;
    hdr.pic_qp = bits.read_bits(6)? as u8;

    hdr.pic_ref_flag = true;
    hdr.no_fwd_ref_flag = false;
    hdr.pb_field_enhanced_flag = false;

    hdr.skip_mode_flag = if !hdr.progressive_frame && !hdr.picture_structure {
        bits.read1()? != 0
    } else {
        false
    };

    bits.skip_bits(4)?;

    parse_loop_filter(&mut bits, &mut hdr)?;
    parse_weight_quant(&mut bits, seq, &mut hdr)?;

    if bits.bits_left() == 0 {
        return Err(Error::bad_stream("I-picture header exhausted"));
    }
    trace!(pic_distance = hdr.pic_distance, qp = hdr.pic_qp, aec = hdr.aec_enable, "I-picture header decoded");
    Ok(hdr)
}

pub fn parse_picture_header_pb(data: &[u8], seq: &SequenceHeader) -> Result<PictureHeader> {
    if data.len() < 8 {
        return Err(Error::bad_stream("PB-picture header too short"));
    }
    let mut bits = BitReader::new(&data[4..]);
    let mut hdr = PictureHeader::default();

    hdr.bbv_delay = bits.read_bits(16)?;
    if seq.profile == PROFILE_BROADCAST {
        bits.skip_bits(1)?;
        hdr.bbv_delay = (hdr.bbv_delay << 7) + bits.read_bits(7)?;
    }

    hdr.pic_type = 1 + bits.read_bits(2)? as u8;
    if hdr.pic_type != PicType::P as u8 && hdr.pic_type != PicType::B as u8 {
        return Err(Error::bad_stream("invalid pic_type in PB-picture header"));
    }

    hdr.pic_distance = bits.read_bits(8)?;
    hdr.bbv_check_times = if seq.low_delay { bits.read_ue8()? } else { 0 };

    hdr.progressive_frame = bits.read1()? != 0;
    if !hdr.progressive_frame {
        hdr.picture_structure = bits.read1()? != 0;
        if !hdr.picture_structure {
            bits.skip_bits(1)?; // advanced_pred_mode_disable, always 1
        }
    } else {
        hdr.picture_structure = true;
    }

    hdr.top_field_first = bits.read1()? != 0;
    hdr.repeat_first_field = bits.read1()? != 0;

    hdr.fixed_pic_qp = bits.read1()? != 0;
    hdr.pic_qp = bits.read_bits(6)? as u8;

    hdr.pic_ref_flag = if !(hdr.pic_type == PicType::B as u8 && hdr.picture_structure) {
        bits.read1()? != 0
    } else {
        true
    };

    hdr.no_fwd_ref_flag = bits.read1()? != 0;
    hdr.pb_field_enhanced_flag = bits.read1()? != 0;

    bits.skip_bits(2)?;
    hdr.skip_mode_flag = bits.read1()? != 0;

    parse_loop_filter(&mut bits, &mut hdr)?;
    parse_weight_quant(&mut bits, seq, &mut hdr)?;

    if bits.bits_left() == 0 {
        return Err(Error::bad_stream("PB-picture header exhausted"));
    }
    trace!(pic_type = hdr.pic_type, pic_distance = hdr.pic_distance, qp = hdr.pic_qp, aec = hdr.aec_enable, "PB-picture header decoded");
    Ok(hdr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack_seq_header() -> Vec<u8> {
        let mut data = vec![0x00, 0x00, 0x01, 0xB0, PROFILE_JIZHUN, 0x20];
        // progressive_seq=1, width=720(0b00001011010000), height=576(0b00001001000000)
        data.extend_from_slice(&[0b1_0000101, 0b1010000_0, 0b0010010_0, 0b00000_01, 0b0_0001_000]);
        while data.len() < 18 {
            data.push(0);
        }
        data
    }

    #[test]
    fn sequence_header_rejects_short_buffer() {
        assert!(parse_sequence_header(&[0u8; 10]).is_err());
    }

    #[test]
    fn sequence_header_extracts_profile_and_level() {
        let data = pack_seq_header();
        let hdr = parse_sequence_header(&data).unwrap();
        assert_eq!(hdr.profile, PROFILE_JIZHUN);
        assert_eq!(hdr.level, 0x20);
    }

    #[test]
    fn broadcast_profile_rejects_reserved_weight_quant_values() {
        let seq = SequenceHeader { profile: PROFILE_BROADCAST, low_delay: false, ..Default::default() };
        // An all-ones payload drives weight_quant_index and weight_quant_model
        // to 0b11 (reserved), which must be rejected.
        let mut data = vec![0x00, 0x00, 0x01, 0xB3];
        data.extend_from_slice(&[0xFF; 8]);
        assert!(parse_picture_header_i(&data, &seq).is_err());
    }

    #[test]
    fn pb_header_rejects_invalid_pic_type() {
        let seq = SequenceHeader::default();
        // pic_type field derived as 1 + 2 bits; all-zero payload yields
        // pic_type=1 (I), which the PB parser must reject.
        let mut data = vec![0x00, 0x00, 0x01, 0xB6];
        data.extend_from_slice(&[0x00; 8]);
        assert!(parse_picture_header_pb(&data, &seq).is_err());
    }
}
