pub mod wellness;

pub use wellness::{
    argmax, format_result_line, label_for, normalize, normalize_reading, resolve_prediction,
    FeatureScale, CLASS_NAMES, NUM_CLASSES, NUM_FEATURES,
};
