use shared::types::Result;
use std::future::Future;

/// Text -> fixed-dimension vector. The same implementation (same `model_id`)
/// must be used to build an index and to query it.
pub trait TextEmbedder: Send + Sync {
    fn model_id(&self) -> &str;

    /// One L2-normalized vector per input, in input order.
    fn embed_documents(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Result<Vec<Vec<f32>>>> + Send;

    fn embed_query(&self, text: &str) -> impl Future<Output = Result<Vec<f32>>> + Send;
}

/// Scale `vector` to unit length in place. Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
