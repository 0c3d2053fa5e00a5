//! End-to-end dispersal properties: split + placement + reconstruction
//! behave as the 2-of-4 scheme promises.

use dfp_core::{PIECE_COUNT, SERVER_COUNT};
use dfp_stripe::{
    combine_pieces, content_mod, infer_mod, mask_pieces, pieces_for_server, split_pieces,
    ModInference, Piece,
};

#[test]
fn mod_one_dispersal_sends_each_piece_twice() {
    let mut copies = [0usize; PIECE_COUNT];
    for server in 0..SERVER_COUNT {
        for id in pieces_for_server(1, server) {
            copies[(id - 1) as usize] += 1;
        }
    }
    assert_eq!(copies, [2; PIECE_COUNT]);

    assert_eq!(pieces_for_server(1, 0), [4, 1]);
    assert_eq!(pieces_for_server(1, 1), [1, 2]);
    assert_eq!(pieces_for_server(1, 2), [2, 3]);
    assert_eq!(pieces_for_server(1, 3), [3, 4]);
}

#[test]
fn any_single_server_loss_is_survivable() {
    let content: Vec<u8> = (0..41u8).collect();
    let residue = content_mod(&content);
    let pieces = split_pieces(&content);

    for lost in 0..SERVER_COUNT {
        // Collect the pieces still reachable from the surviving servers.
        let mut reachable: Vec<Piece> = Vec::new();
        for server in 0..SERVER_COUNT {
            if server == lost {
                continue;
            }
            for id in pieces_for_server(residue, server) {
                if reachable.iter().all(|p| p.id != id) {
                    let piece = pieces.iter().find(|p| p.id == id).unwrap();
                    reachable.push(piece.clone());
                }
            }
        }
        assert_eq!(reachable.len(), PIECE_COUNT, "lost server {lost}");
        assert_eq!(combine_pieces(&reachable).unwrap(), content);
    }
}

#[test]
fn masked_transfer_round_trips() {
    let content: Vec<u8> = (0..100u8).collect();
    let key = b"hunter2";

    let mut pieces = split_pieces(&content);
    mask_pieces(&mut pieces, key).unwrap();
    // What the servers store is not the cleartext stripes.
    assert_ne!(combine_pieces(&pieces).unwrap(), content);

    mask_pieces(&mut pieces, key).unwrap();
    assert_eq!(combine_pieces(&pieces).unwrap(), content);
}

#[test]
fn residue_recovered_from_any_surviving_server() {
    for residue in 0..4u8 {
        for reporting in 0..SERVER_COUNT {
            let pair = pieces_for_server(residue, reporting);
            assert_eq!(
                infer_mod(&[(reporting, pair)]),
                ModInference::Unique(residue)
            );
        }
    }
}
