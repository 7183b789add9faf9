//! Per-face scan overlay engine.
//!
//! Detected faces are bound to lifecycle slots by batch position; each slot
//! runs a fixed-duration Scanning → Gathering → Complete timer that advances
//! once per frame, and the overlay draws a wireframe plus a progress row for
//! every slot still in progress.

pub mod detection {
    pub mod domain {
        pub mod detected_face;
        pub mod detection_dispatcher;
        pub mod face_detector;
    }
    pub mod infrastructure;
}

pub mod overlay {
    pub mod domain {
        pub mod coordinate_mapper;
        pub mod detection_ingest;
        pub mod overlay_renderer;
        pub mod overlay_style;
        pub mod phase;
        pub mod phase_state_machine;
        pub mod slot;
        pub mod slot_store;
    }
}

pub mod pipeline {
    pub mod frame_tick_controller;
    pub mod pipeline_logger;
    pub mod scan_overlay_use_case;
}

pub mod rendering {
    pub mod domain {
        pub mod color;
        pub mod renderer;
    }
    pub mod infrastructure;
}

pub mod shared {
    pub mod constants;
    pub mod frame;
    pub mod point;
    pub mod video_metadata;
}

pub mod video {
    pub mod domain {
        pub mod frame_source;
        pub mod image_writer;
        pub mod video_writer;
    }
    pub mod infrastructure;
}
