use serde::{de::Error, ser::SerializeSeq, Deserialize, Deserializer, Serializer};

use heapless::Vec as InlineVec;

/// Serializes a fixed number of equally-sized byte slices, such as RAM banks, as one sequence.
pub(crate) fn serialize_slices_as_one<Sl: AsRef<[u8]>, Se: Serializer>(
    slices: &[Sl],
    ser: Se,
) -> Result<Se::Ok, Se::Error> {
    let mut seq = ser.serialize_seq(Some(slices.len()))?;
    slices
        .iter()
        .map(AsRef::as_ref)
        .try_for_each(|b| seq.serialize_element(b))
        .and_then(|()| seq.end())
}

pub(crate) fn deserialize_slices_as_one<
    'de,
    const N: usize,
    const M: usize,
    De: Deserializer<'de>,
>(
    de: De,
) -> Result<[[u8; N]; M], De::Error> {
    let slices = InlineVec::<InlineVec<u8, N>, M>::deserialize(de)?;
    let found = slices.len();
    let mut digest = [[0; N]; M];
    if found != M {
        return Err(De::Error::invalid_length(found, &"a full set of banks"));
    }
    for (dest, src) in digest.iter_mut().zip(slices) {
        if src.len() != N {
            return Err(De::Error::invalid_length(src.len(), &"a full bank"));
        }
        dest.copy_from_slice(&src);
    }
    Ok(digest)
}
