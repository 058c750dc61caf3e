pub mod capture {
    pub mod domain {
        pub mod frame_source;
    }
    pub mod infrastructure;
}

pub mod decoding {
    pub mod domain {
        pub mod distribution_decoder;
        pub mod gender;
    }
}

pub mod encoding {
    pub mod domain {
        pub mod layout;
        pub mod tensor_encoder;
    }
}

pub mod inference {
    pub mod domain {
        pub mod inference_engine;
        pub mod raw_outputs;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod attribute_result;
    pub mod classify_frames_use_case;
    pub mod face_attribute_pipeline;
    pub mod pipeline_config;
    pub mod pipeline_logger;
}

pub mod shared {
    pub mod constants;
    pub mod error;
    pub mod frame;
    pub mod model_resolver;
}

pub mod tracking {
    pub mod domain {
        pub mod embedding_tracker;
    }
}
