use serde_json::json;

use crate::record::{
    EvidenceRecord,
    HEAD_CORRECTNESS, FRESHNESS, EXECUTION_CORRECTNESS,
};

// bundled sample evidence, shown only while the log server is unreachable
pub fn records() -> Vec<EvidenceRecord> {
    vec![
        EvidenceRecord::new(
            HEAD_CORRECTNESS,
            false,
            "STATE ROOT MISMATCH at block 29578443",
            json!({
                "block_number": 29578443,
                "ref_root": "0xc8d57c40eba3de124c16f7aeee3530e3685cc13b979ee948a757b65c790a1468",
                "nut_root": "0xffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff",
                "ref_height": 29578443,
                "nut_height": 29578444
            }),
            1768814306.787851,
        ),
        EvidenceRecord::new(
            FRESHNESS,
            false,
            "STALE DATA DETECTED. Node is 35 blocks behind (~210s)",
            json!({
                "ref_height": 29578441,
                "nut_height": 29578406,
                "estimated_lag_seconds": 210,
                "threshold_seconds": 12
            }),
            1768814104.234567,
        ),
        EvidenceRecord::new(
            EXECUTION_CORRECTNESS,
            true,
            "Execution results (fee) match: 159909413",
            json!({
                "ref_fee": 159909413,
                "nut_fee": 159909413,
                "ref_weight": {
                    "ref_time": 492762000,
                    "proof_size": 10779
                },
                "nut_weight": {
                    "ref_time": 492762000,
                    "proof_size": 10779
                }
            }),
            1768814319.173694,
        ),
        EvidenceRecord::new(
            FRESHNESS,
            true,
            "Node is fresh. Node is 0 blocks behind (~0s)",
            json!({
                "ref_height": 29578447,
                "nut_height": 29578447,
                "estimated_lag_seconds": 0,
                "threshold_seconds": 12
            }),
            1768814322.144780,
        ),
        EvidenceRecord::new(
            HEAD_CORRECTNESS,
            true,
            "State roots match at block 29578440",
            json!({
                "block_number": 29578440,
                "ref_root": "0xa1b2c3d4e5f6789012345678901234567890abcdef1234567890abcdef123456",
                "nut_root": "0xa1b2c3d4e5f6789012345678901234567890abcdef1234567890abcdef123456",
                "ref_height": 29578440,
                "nut_height": 29578440
            }),
            1768814200.123456,
        ),
    ]
}
