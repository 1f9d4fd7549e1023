use crate::models::InputShape;

/// Console line reported after every epoch.
pub fn format_epoch_line(epoch: usize, epochs: usize, loss: f32, accuracy: f32) -> String {
    format!(
        "Epoch {}/{}, Loss: {:.4}, Validation Accuracy: {:.2}%",
        epoch, epochs, loss, accuracy
    )
}

/// Console line reported after the final test pass.
pub fn format_test_line(accuracy: f32) -> String {
    format!("Test Accuracy: {:.2}%", accuracy)
}

/// Dataset shape summary printed after extraction.
pub fn format_feature_shape(count: usize, shape: InputShape) -> String {
    format!("Feature shape: {} x {} x {}", count, shape.height, shape.width)
}
