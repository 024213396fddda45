use ndarray::Array2;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use std::sync::Mutex;
use tokenizers::Tokenizer;
use tracing::info;

use crate::assets::ModelAssets;
use crate::SemanticError;

/// How token states become one vector per input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pooling {
    /// Use a pooled `[batch, dim]` output when the graph has one, else mean-pool.
    SentenceOutput,
    /// Require `[batch, seq, dim]` and mean-pool under the attention mask.
    MaskedMean,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct SessionOptions {
    pub(crate) intra_threads: usize,
    pub(crate) use_gpu: bool,
    pub(crate) max_sequence_length: usize,
    pub(crate) token_type_ids: bool,
}

/// Tokenizer + ONNX session pair. `Session::run` takes `&mut self`, hence the mutex.
pub(crate) struct OnnxEncoder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    opts: SessionOptions,
    pooling: Pooling,
}

impl std::fmt::Debug for OnnxEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEncoder")
            .field("opts", &self.opts)
            .field("pooling", &self.pooling)
            .finish_non_exhaustive()
    }
}

impl OnnxEncoder {
    pub(crate) fn load(
        assets: &ModelAssets,
        opts: SessionOptions,
        pooling: Pooling,
    ) -> Result<Self, SemanticError> {
        let tokenizer = Tokenizer::from_file(&assets.tokenizer_path).map_err(|e| {
            SemanticError::TokenizerMissing(format!("{}: {e}", assets.tokenizer_path.display()))
        })?;
        let session = build_session(&assets.model_path, &opts)?;
        info!(
            model = %assets.model_path.display(),
            gpu = opts.use_gpu,
            ?pooling,
            "onnx session ready"
        );
        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            opts,
            pooling,
        })
    }

    /// Raw (unnormalized) vectors, one per input, in input order.
    pub(crate) fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SemanticError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let (encoded, max_len) =
            encode_documents(&self.tokenizer, texts, self.opts.max_sequence_length)?;
        let padded = build_padded_arrays(encoded, max_len)?;

        let ids = TensorRef::from_array_view(&padded.input_ids)
            .map_err(|e| SemanticError::Inference(e.to_string()))?;
        let mask = TensorRef::from_array_view(&padded.attention_mask)
            .map_err(|e| SemanticError::Inference(e.to_string()))?;
        let types = TensorRef::from_array_view(&padded.token_type_ids)
            .map_err(|e| SemanticError::Inference(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| SemanticError::Inference("onnx session lock poisoned".into()))?;

        let outputs = if self.opts.token_type_ids {
            session.run(ort::inputs![ids, mask, types])
        } else {
            session.run(ort::inputs![ids, mask])
        }
        .map_err(|e| SemanticError::Inference(format!("onnx inference failed: {e}")))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| SemanticError::Inference(format!("output extraction: {e}")))?;
        let dims: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();

        pool_output(&dims, data, &padded.attention_mask, self.pooling)
    }
}

fn build_session(model_path: &Path, opts: &SessionOptions) -> Result<Session, SemanticError> {
    let mut builder = Session::builder()
        .map_err(|e| SemanticError::Inference(e.to_string()))?
        .with_intra_threads(opts.intra_threads)
        .map_err(|e| SemanticError::Inference(e.to_string()))?;

    #[cfg(feature = "cuda")]
    let mut builder = if opts.use_gpu {
        builder
            .with_execution_providers([
                ort::execution_providers::CUDAExecutionProvider::default().build()
            ])
            .map_err(|e| SemanticError::Inference(e.to_string()))?
    } else {
        builder
    };

    builder
        .commit_from_file(model_path)
        .map_err(|e| SemanticError::Inference(format!("onnx load failed: {e}")))
}

struct EncodedDoc {
    ids: Vec<i64>,
    mask: Vec<i64>,
}

fn encode_documents(
    tokenizer: &Tokenizer,
    texts: &[&str],
    max_sequence_length: usize,
) -> Result<(Vec<EncodedDoc>, usize), SemanticError> {
    let mut encoded = Vec::with_capacity(texts.len());
    let mut max_len = 0usize;

    for text in texts {
        let encoding = tokenizer
            .encode(*text, true)
            .map_err(|e| SemanticError::Inference(e.to_string()))?;
        let mut ids: Vec<i64> = encoding.get_ids().iter().map(|&x| x as i64).collect();
        let mut mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&x| x as i64)
            .collect();
        ids.truncate(max_sequence_length);
        mask.truncate(max_sequence_length);
        max_len = max_len.max(ids.len());
        encoded.push(EncodedDoc { ids, mask });
    }

    Ok((encoded, max_len))
}

struct PaddedBatch {
    input_ids: Array2<i64>,
    attention_mask: Array2<i64>,
    token_type_ids: Array2<i64>,
}

fn build_padded_arrays(
    encoded: Vec<EncodedDoc>,
    max_len: usize,
) -> Result<PaddedBatch, SemanticError> {
    let seq_len = max_len.max(1);
    let batch = encoded.len();
    let mut id_storage = Vec::with_capacity(batch * seq_len);
    let mut mask_storage = Vec::with_capacity(batch * seq_len);

    for EncodedDoc { ids, mask } in encoded {
        if ids.len() != mask.len() {
            return Err(SemanticError::Inference(
                "tokenizer produced mismatched id/mask lengths".into(),
            ));
        }
        let pad = seq_len.saturating_sub(ids.len());
        id_storage.extend(ids);
        mask_storage.extend(mask);
        id_storage.extend(std::iter::repeat_n(0, pad));
        mask_storage.extend(std::iter::repeat_n(0, pad));
    }

    let input_ids = Array2::from_shape_vec((batch, seq_len), id_storage)
        .map_err(|e| SemanticError::Inference(e.to_string()))?;
    let attention_mask = Array2::from_shape_vec((batch, seq_len), mask_storage)
        .map_err(|e| SemanticError::Inference(e.to_string()))?;
    Ok(PaddedBatch {
        input_ids,
        attention_mask,
        token_type_ids: Array2::zeros((batch, seq_len)),
    })
}

/// Turns the first graph output into one vector per batch row.
fn pool_output(
    dims: &[usize],
    data: &[f32],
    mask: &Array2<i64>,
    pooling: Pooling,
) -> Result<Vec<Vec<f32>>, SemanticError> {
    let (batch, seq_len) = mask.dim();
    match (dims, pooling) {
        ([rows, dim], Pooling::SentenceOutput) => {
            if *dim == 0 || *rows != batch || data.len() != rows * dim {
                return Err(SemanticError::Inference(format!(
                    "unexpected output shape {dims:?} for batch of {batch}"
                )));
            }
            Ok(data.chunks(*dim).map(<[f32]>::to_vec).collect())
        }
        ([rows, tokens, dim], _) => {
            if *dim == 0
                || *rows != batch
                || *tokens != seq_len
                || data.len() != rows * tokens * dim
            {
                return Err(SemanticError::Inference(format!(
                    "unexpected output shape {dims:?}, expected [{batch}, {seq_len}, _]"
                )));
            }
            let mut vectors = Vec::with_capacity(batch);
            for b in 0..batch {
                let mut pooled = vec![0.0f32; *dim];
                let mut mask_sum = 0.0f32;
                for t in 0..seq_len {
                    let weight = mask[[b, t]] as f32;
                    if weight == 0.0 {
                        continue;
                    }
                    mask_sum += weight;
                    let offset = (b * seq_len + t) * dim;
                    for (p, v) in pooled.iter_mut().zip(&data[offset..offset + dim]) {
                        *p += v * weight;
                    }
                }
                if mask_sum > 0.0 {
                    for p in &mut pooled {
                        *p /= mask_sum;
                    }
                }
                vectors.push(pooled);
            }
            Ok(vectors)
        }
        _ => Err(SemanticError::Inference(format!(
            "unsupported output shape {dims:?} for {pooling:?} pooling"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask(rows: &[&[i64]]) -> Array2<i64> {
        let cols = rows[0].len();
        let flat: Vec<i64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Array2::from_shape_vec((rows.len(), cols), flat).unwrap()
    }

    #[test]
    fn sentence_output_rows_are_used_directly() {
        let m = mask(&[&[1, 1], &[1, 0]]);
        let out = pool_output(&[2, 3], &[1., 2., 3., 4., 5., 6.], &m, Pooling::SentenceOutput)
            .unwrap();
        assert_eq!(out, vec![vec![1., 2., 3.], vec![4., 5., 6.]]);
    }

    #[test]
    fn masked_mean_ignores_padding() {
        // Second row has one real token followed by padding.
        let m = mask(&[&[1, 1], &[1, 0]]);
        let data = [
            1.0, 3.0, // b0 t0
            3.0, 5.0, // b0 t1
            2.0, 2.0, // b1 t0
            100.0, 100.0, // b1 t1 (padding)
        ];
        let out = pool_output(&[2, 2, 2], &data, &m, Pooling::MaskedMean).unwrap();
        assert_eq!(out[0], vec![2.0, 4.0]);
        assert_eq!(out[1], vec![2.0, 2.0]);
    }

    #[test]
    fn token_states_are_pooled_for_sentence_models_too() {
        let m = mask(&[&[1, 1]]);
        let out = pool_output(&[1, 2, 1], &[1.0, 3.0], &m, Pooling::SentenceOutput).unwrap();
        assert_eq!(out, vec![vec![2.0]]);
    }

    #[test]
    fn masked_mean_rejects_pooled_output() {
        let m = mask(&[&[1]]);
        let err = pool_output(&[1, 2], &[0.1, 0.2], &m, Pooling::MaskedMean).unwrap_err();
        assert!(err.to_string().contains("unsupported output shape"));
    }

    #[test]
    fn shape_mismatch_is_reported() {
        let m = mask(&[&[1, 1]]);
        assert!(pool_output(&[2, 2, 1], &[0.0; 4], &m, Pooling::MaskedMean).is_err());
    }

    #[test]
    fn padding_fills_short_rows() {
        let docs = vec![
            EncodedDoc {
                ids: vec![101, 7, 102],
                mask: vec![1, 1, 1],
            },
            EncodedDoc {
                ids: vec![101, 102],
                mask: vec![1, 1],
            },
        ];
        let padded = build_padded_arrays(docs, 3).unwrap();
        assert_eq!(padded.input_ids.dim(), (2, 3));
        assert_eq!(padded.attention_mask[[1, 2]], 0);
        assert_eq!(padded.input_ids[[1, 2]], 0);
        assert!(padded.token_type_ids.iter().all(|&t| t == 0));
    }

    #[test]
    fn padding_rejects_mismatched_lengths() {
        let docs = vec![EncodedDoc {
            ids: vec![1, 2],
            mask: vec![1],
        }];
        assert!(build_padded_arrays(docs, 2).is_err());
    }
}
