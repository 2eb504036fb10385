pub mod face_mask;
