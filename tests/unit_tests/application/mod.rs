mod conversion_worker_test;
mod fingerprinter_test;
