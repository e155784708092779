use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

use qadb_core::error::{Error, Result};

/// Tokenize a batch into `(input_ids, attention_mask)`, both `[B, T]`.
///
/// Rows are truncated to `max_len` and right-padded with `pad_id` to the
/// longest row in the batch.
pub fn tokenize_batch(
    tokenizer: &Tokenizer,
    texts: &[String],
    max_len: usize,
    pad_id: u32,
    device: &Device,
) -> Result<(Tensor, Tensor)> {
    let mut rows = Vec::with_capacity(texts.len());
    for text in texts {
        let enc = tokenizer
            .encode(text.as_str(), true)
            .map_err(|e| Error::Encoding(format!("Tokenization failed: {e}")))?;
        let mut ids = enc.get_ids().to_vec();
        let mut mask = enc.get_attention_mask().to_vec();
        ids.truncate(max_len);
        mask.truncate(max_len);
        rows.push((ids, mask));
    }

    let seq_len = rows.iter().map(|(ids, _)| ids.len()).max().unwrap_or(0).max(1);
    let mut all_ids = Vec::with_capacity(rows.len() * seq_len);
    let mut all_mask = Vec::with_capacity(rows.len() * seq_len);
    for (mut ids, mut mask) in rows {
        ids.resize(seq_len, pad_id);
        mask.resize(seq_len, 0);
        all_ids.extend(ids);
        all_mask.extend(mask);
    }

    let shape = (texts.len(), seq_len);
    let to_err = |e: candle_core::Error| Error::Encoding(e.to_string());
    let input_ids = Tensor::from_vec(all_ids, shape, device).map_err(to_err)?;
    let attention_mask = Tensor::from_vec(all_mask, shape, device).map_err(to_err)?;
    Ok((input_ids, attention_mask))
}
