//! Splitting a file into pieces and reassembling it.

use dfp_core::PIECE_COUNT;

use crate::error::StripeError;

/// One piece of a striped file. Ids run 1..=4; the payload carries no
/// per-piece checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub id: u8,
    pub data: Vec<u8>,
}

/// Split content into exactly [`PIECE_COUNT`] pieces of equal length, the
/// last absorbing the `len % 4` remainder.
#[must_use]
pub fn split_pieces(data: &[u8]) -> Vec<Piece> {
    let base = data.len() / PIECE_COUNT;
    let mut pieces = Vec::with_capacity(PIECE_COUNT);
    for index in 0..PIECE_COUNT {
        let start = index * base;
        let end = if index == PIECE_COUNT - 1 {
            data.len()
        } else {
            start + base
        };
        #[allow(clippy::cast_possible_truncation)]
        pieces.push(Piece {
            id: (index + 1) as u8,
            data: data[start..end].to_vec(),
        });
    }
    pieces
}

/// Reassemble the original content from pieces in any order.
///
/// # Errors
/// Returns `StripeError` when an id is out of range, duplicated, or
/// missing from the set.
pub fn combine_pieces(pieces: &[Piece]) -> Result<Vec<u8>, StripeError> {
    let mut slots: [Option<&[u8]>; PIECE_COUNT] = [None; PIECE_COUNT];
    for piece in pieces {
        if piece.id == 0 || piece.id as usize > PIECE_COUNT {
            return Err(StripeError::PieceIdOutOfRange {
                id: piece.id,
                max: PIECE_COUNT as u8,
            });
        }
        let slot = &mut slots[(piece.id - 1) as usize];
        if slot.is_some() {
            return Err(StripeError::DuplicatePiece { id: piece.id });
        }
        *slot = Some(&piece.data);
    }

    let mut out = Vec::with_capacity(pieces.iter().map(|p| p.data.len()).sum());
    for (index, slot) in slots.iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let data = slot.ok_or(StripeError::MissingPiece {
            id: (index + 1) as u8,
        })?;
        out.extend_from_slice(data);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remainder_goes_to_the_last_piece() {
        let data: Vec<u8> = (0..41).collect();
        let pieces = split_pieces(&data);
        assert_eq!(pieces.len(), 4);
        assert_eq!(pieces[0].data.len(), 10);
        assert_eq!(pieces[1].data.len(), 10);
        assert_eq!(pieces[2].data.len(), 10);
        assert_eq!(pieces[3].data.len(), 11);
        assert_eq!(
            pieces.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
    }

    #[test]
    fn split_combine_round_trip() {
        for len in [0usize, 1, 3, 4, 5, 41, 1024, 4096 + 3] {
            let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let pieces = split_pieces(&data);
            assert_eq!(combine_pieces(&pieces).unwrap(), data);
        }
    }

    #[test]
    fn combine_accepts_any_order() {
        let data: Vec<u8> = (0..20).collect();
        let mut pieces = split_pieces(&data);
        pieces.reverse();
        assert_eq!(combine_pieces(&pieces).unwrap(), data);
    }

    #[test]
    fn combine_rejects_missing_piece() {
        let mut pieces = split_pieces(&[1, 2, 3, 4, 5, 6, 7, 8]);
        pieces.remove(2);
        assert_eq!(
            combine_pieces(&pieces),
            Err(StripeError::MissingPiece { id: 3 })
        );
    }

    #[test]
    fn combine_rejects_duplicate_piece() {
        let mut pieces = split_pieces(&[1, 2, 3, 4, 5, 6, 7, 8]);
        pieces[1].id = 1;
        assert_eq!(
            combine_pieces(&pieces),
            Err(StripeError::DuplicatePiece { id: 1 })
        );
    }

    #[test]
    fn combine_rejects_out_of_range_id() {
        let mut pieces = split_pieces(&[1, 2, 3, 4]);
        pieces[0].id = 5;
        assert_eq!(
            combine_pieces(&pieces),
            Err(StripeError::PieceIdOutOfRange { id: 5, max: 4 })
        );
    }

    #[test]
    fn tiny_files_leave_leading_pieces_empty() {
        let pieces = split_pieces(&[0xAB, 0xCD]);
        assert!(pieces[0].data.is_empty());
        assert!(pieces[1].data.is_empty());
        assert!(pieces[2].data.is_empty());
        assert_eq!(pieces[3].data, vec![0xAB, 0xCD]);
    }
}
