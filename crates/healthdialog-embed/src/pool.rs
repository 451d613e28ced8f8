use anyhow::{ensure, Result};
use candle_core::{DType, Tensor};

/// Sentence-transformers pooling: mean over unmasked tokens, then unit L2
/// norm. `hidden` is `[B,T,H]`, `attention_mask` is `[B,T]` of 0/1 in any dtype.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let dims = hidden.dims();
    ensure!(dims.len() == 3, "hidden shape must be [B,T,H], got {:?}", dims);
    let (batch, hidden_dim) = (dims[0], dims[2]);

    let pooled = l2_normalize(&masked_mean(hidden, attention_mask)?)?;
    ensure!(pooled.dims() == [batch, hidden_dim], "pooled shape mismatch: {:?}", pooled.dims());
    Ok(pooled)
}

fn masked_mean(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let summed = hidden.broadcast_mul(&mask.unsqueeze(2)?)?.sum(1)?;
    // all-padding rows would divide by zero
    let counts = mask.sum_keepdim(1)?.maximum(1f64)?;
    Ok(summed.broadcast_div(&counts)?)
}

fn l2_normalize(v: &Tensor) -> Result<Tensor> {
    let eps = match v.dtype() { DType::F16 | DType::BF16 => 1e-6, _ => 1e-12 };
    let norm = (v.sqr()?.sum_keepdim(1)?.sqrt()? + eps)?;
    Ok(v.broadcast_div(&norm)?)
}
