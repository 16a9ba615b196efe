//! search モジュールのテスト

mod alpha_beta;
