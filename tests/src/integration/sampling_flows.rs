//! # Sampling Flow Tests
//!
//! From synced store to sampled view to bead plate, plus rule book edits
//! and property checks on the store and the alignment filter.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;

    use ht_block_sync::{
        build_bead_grid, is_aligned, sample_view, tally, BlockRecord, BlockStore, BlockSyncApi,
        BlockSyncService, Classification, ClassificationAxis, MockChainSource, RuleBook,
        SamplingRule, SyncConfig, SyncError,
    };

    fn block(height: u64) -> BlockRecord {
        MockChainSource::block_at(height)
    }

    fn rule(stride: u64, anchor: u64) -> SamplingRule {
        SamplingRule::new("r", "r", stride, anchor).unwrap()
    }

    // =============================================================================
    // ALIGNMENT
    // =============================================================================

    #[test]
    fn test_absolute_and_anchored_views() {
        let store = BlockStore::new(2000);
        store.merge((100..=140).map(block));
        let snapshot = store.snapshot();

        let absolute: Vec<u64> = sample_view(&snapshot, &rule(20, 0))
            .iter()
            .map(|b| b.height)
            .collect();
        assert_eq!(absolute, vec![140, 120, 100]);

        let anchored: Vec<u64> = sample_view(&snapshot, &rule(20, 105))
            .iter()
            .map(|b| b.height)
            .collect();
        assert_eq!(anchored, vec![125]);
    }

    #[test]
    fn test_capacity_scenario() {
        let store = BlockStore::new(2000);
        store.merge((1..=2500).map(block));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2000);
        assert_eq!(snapshot[0].height, 2500);
        assert_eq!(snapshot[1999].height, 501);
    }

    // =============================================================================
    // BEAD PLATE
    // =============================================================================

    #[tokio::test]
    async fn test_bead_plate_from_service() {
        let source = Arc::new(MockChainSource::new(140));
        let service = BlockSyncService::new(SyncConfig::default(), source).unwrap();
        service.backfill(&rule(1, 0), 13).await.unwrap();

        // Heights 128..=140, result_value = height % 10.
        let plate = service
            .bead_plate(&rule(1, 0), ClassificationAxis::Parity, 6)
            .unwrap();
        assert_eq!(plate.len(), 3);
        assert_eq!(plate[0][0].value, Some(8));
        assert_eq!(plate[0][0].kind, Some(Classification::Even));
        assert_eq!(plate[0][1].kind, Some(Classification::Odd));
        assert_eq!(plate[2][0].value, Some(0));
        assert!(plate[2][1..].iter().all(|cell| cell.is_empty()));

        let view = service.sampled_view(&rule(1, 0));
        let size = tally(&view, ClassificationAxis::Size);
        assert_eq!(size.total(), 13);
    }

    #[test]
    fn test_zero_rows_rejected() {
        assert!(matches!(
            build_bead_grid(&[block(1)], ClassificationAxis::Parity, 0),
            Err(SyncError::InvalidConfig(_))
        ));
    }

    // =============================================================================
    // RULE BOOK
    // =============================================================================

    #[test]
    fn test_rule_book_edit_flow() {
        let mut book = RuleBook::with_defaults();
        assert_eq!(book.len(), 4);

        let custom = SamplingRule::custom("from 105", 20, 105).unwrap();
        let id = custom.id.clone();
        book.upsert(custom).unwrap();
        book.activate(&id).unwrap();
        assert_eq!(book.active().anchor_height, 105);

        let mut edited = book.active().clone();
        edited.stride = 40;
        book.upsert(edited).unwrap();
        assert_eq!(book.len(), 5);
        assert_eq!(book.active().stride, 40);

        book.delete(&id).unwrap();
        assert_eq!(book.active().id, book.rules()[0].id);

        let mut bad = book.active().clone();
        bad.stride = 0;
        assert!(matches!(book.upsert(bad), Err(SyncError::InvalidRule(_))));
    }

    #[test]
    fn test_last_rule_cannot_be_deleted() {
        let mut book = RuleBook::new(vec![rule(5, 0)]).unwrap();
        assert!(matches!(book.delete("r"), Err(SyncError::InvalidRule(_))));
        assert!(matches!(book.delete("nope"), Err(SyncError::UnknownRule(_))));
        assert_eq!(book.len(), 1);
    }

    // =============================================================================
    // PROPERTIES
    // =============================================================================

    proptest! {
        #[test]
        fn prop_store_invariants_hold(
            batches in prop::collection::vec(prop::collection::vec(1u64..5000, 0..200), 1..6),
            capacity in 1usize..300,
        ) {
            let store = BlockStore::new(capacity);
            for batch in &batches {
                store.merge(batch.iter().copied().map(block));
            }
            let heights = store.heights();
            prop_assert!(heights.len() <= capacity);
            prop_assert!(heights.windows(2).all(|w| w[0] > w[1]));
        }

        #[test]
        fn prop_merge_idempotent(heights in prop::collection::vec(1u64..1000, 0..100)) {
            let store = BlockStore::new(2000);
            store.merge(heights.iter().copied().map(block));
            let before = store.snapshot();
            let outcome = store.merge(heights.iter().copied().map(block));
            prop_assert_eq!(outcome.inserted, 0);
            prop_assert_eq!(store.snapshot(), before);
        }

        #[test]
        fn prop_bead_grid_paginates(n in 0u64..200, rows in 1usize..10) {
            let blocks: Vec<BlockRecord> = (1..=n).map(block).collect();
            let grid = build_bead_grid(&blocks, ClassificationAxis::Parity, rows).unwrap();

            prop_assert_eq!(grid.len(), blocks.len().div_ceil(rows));
            prop_assert!(grid.iter().all(|column| column.len() == rows));
            if let Some(oldest) = blocks.first() {
                prop_assert_eq!(grid[0][0].value, Some(oldest.result_value));
            }
            for (index, cell) in grid.iter().flatten().enumerate() {
                match blocks.get(index) {
                    Some(block) => {
                        prop_assert_eq!(cell.value, Some(block.result_value));
                    }
                    None => {
                        prop_assert!(cell.is_empty());
                    }
                }
            }
        }

        #[test]
        fn prop_anchored_alignment(h in 0u64..100_000, stride in 2u64..500, anchor in 1u64..50_000) {
            let rule = rule(stride, anchor);
            prop_assert_eq!(
                is_aligned(h, &rule),
                h >= anchor && (h - anchor) % stride == 0
            );
        }
    }
}
